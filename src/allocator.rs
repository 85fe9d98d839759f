//! Memory Allocator Configuration
//!
//! The binary uses mimalloc instead of the system allocator. Planning and
//! path handling allocate many short-lived strings and paths, which mimalloc
//! serves from thread-local free lists.

use mimalloc::MiMalloc;

/// Global memory allocator instance using mimalloc
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
