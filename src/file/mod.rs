//! Path resolution and validation of user-supplied locations.
//!
//! - [`resolve`]: Raw input to ordered path candidates
//! - [`validation`]: Existence, deny-list and duplicate filtering
//! - [`operations`]: Source sizing and small filesystem helpers

pub mod operations;
pub mod resolve;
pub mod validation;

pub use operations::{SourceSize, has_entries, load_file_list, name_of, source_size, stem_of};
pub use resolve::{PathCandidate, resolve, split_input, unescape};
pub use validation::{Rejection, ValidatedFileSet, Validation, flag_suspicious_length, is_denied, is_denied_output, is_excluded, normalize, validate_existing};
