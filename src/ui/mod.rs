//! Terminal user interface.
//!
//! # Modules
//!
//! - [`display`]: Banner, status lines, tables and reports
//! - [`progress`]: Spinner for blocking steps
//! - [`prompt`]: Menus, inputs and the interactive plan decisions

pub mod display;
pub mod progress;
pub mod prompt;
