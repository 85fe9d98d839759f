//! Global Configuration Constants
//!
//! Every tunable the orchestrator relies on lives here: resource thresholds,
//! estimation tables, path policies, archiver discovery and the persisted
//! preference defaults.
//!
//! ## Design Philosophy
//!
//! - **Enumerable**: tables are plain arrays indexed by compression level
//! - **Conservative**: thresholds err toward asking the user
//! - **Local**: nothing here is read from the environment at runtime

/// Application name used in banners and prompts
pub const APP_NAME: &str = "Packrat";

/// File name of the persisted preference record, relative to the home directory
pub const PREFERENCES_FILE_NAME: &str = ".packrat_preferences.json";

// === Archiver Discovery ===

/// Executable name looked up next to the running binary
pub const BUNDLED_ARCHIVER_NAME: &str = "7zz";

/// Fixed installation paths tried after the bundled binary, in order
pub const ARCHIVER_SEARCH_PATHS: &[&str] = &["/usr/local/bin/7zz", "/opt/homebrew/bin/7zz", "/usr/local/bin/7z", "/opt/homebrew/bin/7z"];

/// Executable names resolved through `PATH` as the final fallback
pub const ARCHIVER_PATH_NAMES: &[&str] = &["7zz", "7z", "7za"];

// === Path Handling ===

/// Input longer than this that does not end in a separator-like character
/// is flagged as possibly truncated by the terminal.
///
/// The value carries no deeper meaning than "larger than typical terminal
/// paste buffers", so it stays a tunable.
pub const TRUNCATION_THRESHOLD: usize = 4000;

/// Characters that mark a cleanly terminated long input
pub const TRUNCATION_SAFE_ENDINGS: &[char] = &[' ', '\t', '/'];

/// Absolute path prefixes that are never archived or written to
pub const DENIED_PREFIXES: &[&str] = &["/System", "/usr/bin", "/private"];

/// Prefixes refused as archive output locations
pub const DENIED_OUTPUT_PREFIXES: &[&str] = &["/System", "/usr/bin"];

/// Extensions accepted as-is on an output path; anything else gets [`DEFAULT_EXTENSION`]
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".7z", ".zip", ".tar", ".gz"];

/// Extension appended when the output path carries none of [`ACCEPTED_EXTENSIONS`]
pub const DEFAULT_EXTENSION: &str = ".7z";

/// Directory name used for extraction when the user accepts the default
pub const DEFAULT_EXTRACT_DIR: &str = "extracted";

// === Resource Estimation ===
// Indexed by compression level 0..=9.

/// Estimated working memory (GB) the archiver needs per compression level
pub const MEMORY_TABLE_GB: [f64; 10] = [0.1, 0.2, 0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 12.0, 16.0];

/// Estimated output/input size ratio per compression level
pub const RATIO_TABLE: [f64; 10] = [1.0, 0.7, 0.65, 0.6, 0.55, 0.5, 0.45, 0.4, 0.35, 0.3];

/// Available memory below this many GB always raises a warning
pub const MEMORY_FLOOR_GB: f64 = 2.0;

/// Load-average-per-core percentage above which CPU load is reported
pub const CPU_LOAD_THRESHOLD: f64 = 70.0;

/// Free space must be at least this multiple of the estimated output size
pub const DISK_REQUIRED_FACTOR: f64 = 1.2;

/// Free space below this multiple of the estimate (but above the required
/// factor) is reported as tight
pub const DISK_COMFORT_FACTOR: f64 = 2.4;

/// Without an estimate, free space below this many bytes is reported
pub const DISK_LOW_BYTES: u64 = 1024 * 1024 * 1024;

/// Compression levels at or above this always need an explicit confirmation
pub const ELEVATED_LEVEL: u8 = 8;

// === Splitting ===

/// Total source size above which split volumes are offered (10 GiB)
pub const SPLIT_THRESHOLD: u64 = 10 * 1024 * 1024 * 1024;

/// Split tokens offered as presets, passed verbatim to the archiver
pub const SPLIT_PRESETS: &[&str] = &["4000m", "2000m"];

// === Passwords ===

/// Minimum accepted archive password length
pub const PASSWORD_MIN_LENGTH: usize = 4;

// === Preference Defaults ===

/// File name patterns excluded from new archives unless the user edits them
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[".DS_Store", ".Thumbs.db", "Thumbs.db"];

/// Output directory used when no preference is stored, relative to the home directory
pub const DEFAULT_OUTPUT_SUBDIR: &str = "Desktop";

/// Compression level used by the "balanced" preset and as the fallback custom level
pub const BALANCED_LEVEL: u8 = 5;
