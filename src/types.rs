//! Common type definitions for Packrat.
//!
//! Provides the small value types shared by the planner, the gateway and the
//! interactive session.
//!
//! # Overview
//!
//! - [`CompressionLevel`]: A validated archiver level in `0..=9`
//! - [`CompressionPreset`]: The saved compression preference
//! - [`ArchiveFormat`]: Container format derived from an output path and its capabilities
//! - [`Action`]: Archiver verbs
//! - [`MenuChoice`]: Entries of the main menu
//! - [`ViewAction`]: Read-only archive operations

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::config::{BALANCED_LEVEL, ELEVATED_LEVEL};
use crate::error::InputError;

/// Archiver compression level, always within `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Store only.
    pub const STORE: Self = Self(0);

    /// Level used by the "fast" preset.
    pub const FAST: Self = Self(1);

    /// Level used by the "balanced" preset.
    pub const BALANCED: Self = Self(BALANCED_LEVEL);

    /// Highest level the archiver accepts.
    pub const MAXIMUM: Self = Self(9);

    /// Creates a level, rejecting values above 9.
    pub fn new(level: u8) -> Result<Self, InputError> {
        if level > Self::MAXIMUM.0 {
            return Err(InputError::Level(level));
        }
        Ok(Self(level))
    }

    /// Returns the raw level.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns the level as a table index.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Whether this level always needs an explicit confirmation.
    #[inline]
    pub fn is_elevated(self) -> bool {
        self.0 >= ELEVATED_LEVEL
    }

    /// Iterates every valid level in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAXIMUM.0).map(Self)
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = InputError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::BALANCED
    }
}

impl Display for CompressionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Level {}", self.0)
    }
}

/// Saved compression preference.
///
/// Serialized in lower case so the persisted record stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, StrumDisplay, EnumString, EnumIter, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompressionPreset {
    /// Always level 1.
    Fast,

    /// Always level 5.
    #[default]
    Balanced,

    /// Always level 9, behind an extra confirmation.
    Maximum,

    /// The stored custom level.
    Custom,

    /// Show the preset menu on every run.
    Ask,
}

impl CompressionPreset {
    /// Human label used in menus.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast (Level 1) - Quick compression, larger files",
            Self::Balanced => "Balanced (Level 5) - Good compression, reasonable speed",
            Self::Maximum => "Maximum (Level 9) - Best compression, slower",
            Self::Custom => "Custom Level (0-9) - Advanced users",
            Self::Ask => "Always Ask - Show preset menu each time",
        }
    }
}

/// Container format of an archive, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum ArchiveFormat {
    #[strum(to_string = "7Z")]
    SevenZip,
    #[strum(to_string = "ZIP")]
    Zip,
    #[strum(to_string = "TAR")]
    Tar,
    #[strum(to_string = "GZ")]
    Gzip,
}

impl ArchiveFormat {
    /// Classifies an output path by its (case-insensitive) extension.
    ///
    /// Unknown or missing extensions are treated as 7z, which is what the
    /// archiver produces for them.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
        match ext.as_str() {
            "zip" => Self::Zip,
            "tar" => Self::Tar,
            "gz" | "tgz" => Self::Gzip,
            _ => Self::SevenZip,
        }
    }

    /// Whether the archiver accepts a compression level for this format.
    #[inline]
    pub fn supports_compression_level(self) -> bool {
        !matches!(self, Self::Tar)
    }

    /// Whether the format can carry a password.
    #[inline]
    pub fn supports_password(self) -> bool {
        matches!(self, Self::SevenZip | Self::Zip)
    }

    /// Whether the format holds exactly one file.
    #[inline]
    pub fn single_file_only(self) -> bool {
        matches!(self, Self::Gzip)
    }

    /// Whether file names and structure can be encrypted too.
    #[inline]
    pub fn supports_header_encryption(self) -> bool {
        matches!(self, Self::SevenZip)
    }
}

/// Archiver verbs understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Action {
    #[strum(to_string = "Archive creation")]
    Create,
    #[strum(to_string = "Extraction")]
    Extract,
    #[strum(to_string = "Listing")]
    List,
    #[strum(to_string = "Integrity test")]
    Test,
    #[strum(to_string = "Info")]
    Info,
}

impl Action {
    /// Command-line verb passed as the archiver's first argument.
    #[inline]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "a",
            Self::Extract => "x",
            Self::List => "l",
            Self::Test => "t",
            Self::Info => "i",
        }
    }
}

/// Entries of the interactive main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MenuChoice {
    Create,
    Extract,
    View,
    Preferences,
    Help,
    Exit,
}

impl MenuChoice {
    /// Returns a human-readable label for the entry.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "Create Archive",
            Self::Extract => "Extract Archive",
            Self::View => "View Archive Contents",
            Self::Preferences => "User Preferences",
            Self::Help => "Help & Tips",
            Self::Exit => "Exit",
        }
    }
}

impl Display for MenuChoice {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// Read-only operations offered for an existing archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, StrumDisplay, EnumIter)]
pub enum ViewAction {
    #[default]
    #[strum(to_string = "List contents (basic)")]
    List,
    #[strum(to_string = "List contents (detailed)")]
    ListTechnical,
    #[strum(to_string = "Test archive integrity")]
    Test,
    #[strum(to_string = "Archive technical info")]
    Info,
}
