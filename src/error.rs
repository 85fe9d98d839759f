//! Error taxonomy for the orchestrator.
//!
//! Each class maps to one recovery policy:
//!
//! - [`InputError`]: recoverable, the caller re-prompts
//! - [`ConfigurationError`]: auto-corrected, surfaced as a warning
//! - [`ResourceWarning`]: advisory, needs an explicit override
//! - [`ToolError`]: reported with the archiver's exit code, never retried
//! - [`PersistenceError`]: non-fatal, preferences fall back to defaults

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Action, ArchiveFormat};

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid or unresolvable user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Neither form of a path exists.
    #[error("file or folder not found: {0}")]
    NotFound(String),

    /// Nothing usable was entered.
    #[error("no input provided")]
    Empty,

    /// Path lies under a protected system prefix.
    #[error("refusing to use system location: {}", .0.display())]
    DeniedLocation(PathBuf),

    /// A replacement output name also points at an existing file.
    #[error("file still exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Selection text could not be parsed or selected nothing.
    #[error("invalid selection: {0}")]
    Selection(String),

    /// Split size token is not `<digits>[b|k|m|g]`.
    #[error("invalid split size: {0}")]
    SplitSize(String),

    /// Compression level outside 0..=9.
    #[error("compression level must be between 0 and 9, got {0}")]
    Level(u8),

    /// A preference patch names an unknown key or carries a wrong type.
    #[error("invalid preference value: {0}")]
    Preference(String),

    /// The user backed out at a decision point.
    #[error("operation cancelled")]
    Cancelled,
}

/// Requested capability the destination format cannot carry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Password requested for a format without encryption support.
    #[error("{0} format does not support password protection; the archive will be created without encryption")]
    PasswordUnsupported(ArchiveFormat),

    /// Several files, or a folder, planned into a single-file format.
    #[error("{0} format holds a single file; 7-Zip will reject these sources, choose .7z or .zip to bundle them")]
    SingleFileOnly(ArchiveFormat),
}

/// A resource threshold that was crossed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceWarning {
    /// The level's memory estimate exceeds what is available.
    #[error("Compression Level {level} may need {required_gb:.1}GB but only {available_gb:.1}GB available")]
    MemoryShortfall { level: u8, required_gb: f64, available_gb: f64 },

    /// Available memory is below the fixed floor.
    #[error("Low system memory: only {available_gb:.1}GB available")]
    LowMemory { available_gb: f64 },

    /// Memory state could not be read and the level is elevated.
    #[error("Compression Level {level} uses extreme amounts of memory")]
    ExtremeLevel { level: u8 },

    /// Load average per core is above the threshold.
    #[error("High CPU load detected ({percent:.1}%)")]
    HighCpuLoad { percent: f64 },

    /// Free space is below the required multiple of the estimate.
    #[error("Not enough disk space: ~{required} bytes required, {available} bytes available")]
    DiskShortfall { required: u64, available: u64 },
}

/// Failures at the archiver boundary.
#[derive(Error, Debug)]
pub enum ToolError {
    /// No archiver executable could be located or verified.
    #[error("7-Zip executable not found (searched {searched})")]
    NotFound { searched: String },

    /// The executable exists but could not be started.
    #[error("failed to run {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit; the code is passed through verbatim (-1 when killed by a signal).
    #[error("{action} failed (error code: {code})")]
    Exit { action: Action, code: i32 },
}

impl ToolError {
    /// Likely causes shown next to a non-zero exit.
    pub const LIKELY_CAUSES: &'static [&'static str] = &["Insufficient disk space", "Permission issues", "Invalid file paths", "Corrupted source files"];

    /// Exit code carried by the error, if it came from the archiver.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Preference record could not be read, parsed, written or removed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("could not read preferences {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed preferences {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not save preferences {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not remove preferences {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any error produced by the orchestrator core.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_carries_code() {
        let err = ToolError::Exit { action: Action::Create, code: 2 };
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(err.to_string(), "Archive creation failed (error code: 2)");
    }

    #[test]
    fn test_resource_warning_messages() {
        let warning = ResourceWarning::HighCpuLoad { percent: 85.3 };
        assert_eq!(warning.to_string(), "High CPU load detected (85.3%)");

        let warning = ResourceWarning::MemoryShortfall { level: 9, required_gb: 16.0, available_gb: 3.5 };
        assert_eq!(warning.to_string(), "Compression Level 9 may need 16.0GB but only 3.5GB available");
    }

    #[test]
    fn test_configuration_error_names_format() {
        let err = ConfigurationError::PasswordUnsupported(ArchiveFormat::Tar);
        assert!(err.to_string().starts_with("TAR format"));
    }
}
