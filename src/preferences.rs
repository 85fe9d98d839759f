//! Persisted user preferences.
//!
//! The record is a flat JSON object in the user's home directory. Loading
//! overlays whatever keys the file holds on top of the built-in defaults, so
//! older or partial files keep working. A key whose value does not fit is
//! skipped on its own; a file that is not a JSON object is ignored with a
//! diagnostic. Saving writes the whole record to a temporary file next to the
//! target and renames it into place.
//!
//! The store is an ordinary value owned by the session and passed by
//! reference to whatever needs it.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumIter, EnumString, IntoStaticStr};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_EXCLUDE_PATTERNS, DEFAULT_OUTPUT_SUBDIR, PREFERENCES_FILE_NAME};
use crate::error::{InputError, PersistenceError};
use crate::types::{CompressionLevel, CompressionPreset};

/// Every persisted option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub compression_preset: CompressionPreset,
    pub custom_compression_level: CompressionLevel,
    pub default_output_directory: PathBuf,
    pub auto_open_after_extract: bool,
    pub exclude_patterns: Vec<String>,
    pub remember_last_directory: bool,
    pub last_output_directory: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        let desktop = home::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(DEFAULT_OUTPUT_SUBDIR);

        Self {
            compression_preset: CompressionPreset::Balanced,
            custom_compression_level: CompressionLevel::BALANCED,
            default_output_directory: desktop.clone(),
            auto_open_after_extract: false,
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| (*p).to_owned()).collect(),
            remember_last_directory: true,
            last_output_directory: Some(desktop),
        }
    }
}

impl Preferences {
    /// Overwrites one field from its stored JSON value.
    fn apply(&mut self, key: PreferenceKey, value: Value) -> serde_json::Result<()> {
        use serde_json::from_value;

        match key {
            PreferenceKey::CompressionPreset => self.compression_preset = from_value(value)?,
            PreferenceKey::CustomCompressionLevel => self.custom_compression_level = from_value(value)?,
            PreferenceKey::DefaultOutputDirectory => self.default_output_directory = from_value(value)?,
            PreferenceKey::AutoOpenAfterExtract => self.auto_open_after_extract = from_value(value)?,
            PreferenceKey::ExcludePatterns => self.exclude_patterns = from_value(value)?,
            PreferenceKey::RememberLastDirectory => self.remember_last_directory = from_value(value)?,
            PreferenceKey::LastOutputDirectory => self.last_output_directory = from_value(value)?,
        }
        Ok(())
    }

    /// Directory suggested for new archives.
    pub fn output_directory(&self) -> &Path {
        match &self.last_output_directory {
            Some(last) if self.remember_last_directory => last,
            _ => &self.default_output_directory,
        }
    }
}

/// Names of the persisted keys, as they appear in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PreferenceKey {
    CompressionPreset,
    CustomCompressionLevel,
    DefaultOutputDirectory,
    AutoOpenAfterExtract,
    ExcludePatterns,
    RememberLastDirectory,
    LastOutputDirectory,
}

impl PreferenceKey {
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Location of the preference record in the user's home directory.
pub fn default_path() -> PathBuf {
    home::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(PREFERENCES_FILE_NAME)
}

/// Reads the record at `path`, merged over the defaults.
///
/// A missing file is not an error and yields the defaults.
pub fn load_from(path: &Path) -> Result<Preferences, PersistenceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::default()),
        Err(source) => return Err(PersistenceError::Read { path: path.to_path_buf(), source }),
    };

    let stored: Map<String, Value> = serde_json::from_str(&content).map_err(|source| PersistenceError::Parse { path: path.to_path_buf(), source })?;

    let mut prefs = Preferences::default();
    for (name, value) in stored {
        let Ok(key) = PreferenceKey::from_str(&name) else {
            debug!(key = name, "ignoring unknown preference key");
            continue;
        };

        if let Err(e) = prefs.apply(key, value) {
            warn!(key = name, error = %e, "ignoring invalid preference value");
        }
    }

    Ok(prefs)
}

/// In-memory preference record bound to its file.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Opens the store at `path`, loading it immediately.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self { path: path.into(), prefs: Preferences::default() };
        store.load();
        store
    }

    /// Opens the store at [`default_path`].
    pub fn open_default() -> Self {
        Self::open(default_path())
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Re-reads the file; on any failure the defaults are used.
    pub fn load(&mut self) -> &Preferences {
        self.prefs = load_from(&self.path).unwrap_or_else(|e| {
            warn!(error = %e, "using default preferences");
            Preferences::default()
        });
        &self.prefs
    }

    /// Writes the full record atomically.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let write_err = |source| PersistenceError::Write { path: self.path.clone(), source };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        serde_json::to_writer_pretty(&mut tmp, &self.prefs).map_err(|e| write_err(e.into()))?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    /// Saves, reporting a failure as a diagnostic only.
    ///
    /// Returns whether the record reached the disk.
    pub fn save_or_warn(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "preferences not saved");
                false
            }
        }
    }

    /// Deletes the file and returns to the defaults.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "preferences reset"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(PersistenceError::Remove { path: self.path.clone(), source }),
        }

        self.load();
        Ok(())
    }

    /// Returns one key to its unset state and saves.
    ///
    /// The last output directory becomes absent; every other key returns to
    /// its default value.
    pub fn clear_one(&mut self, key: PreferenceKey) {
        let defaults = Preferences::default();

        match key {
            PreferenceKey::CompressionPreset => self.prefs.compression_preset = defaults.compression_preset,
            PreferenceKey::CustomCompressionLevel => self.prefs.custom_compression_level = defaults.custom_compression_level,
            PreferenceKey::DefaultOutputDirectory => self.prefs.default_output_directory = defaults.default_output_directory,
            PreferenceKey::AutoOpenAfterExtract => self.prefs.auto_open_after_extract = defaults.auto_open_after_extract,
            PreferenceKey::ExcludePatterns => self.prefs.exclude_patterns = defaults.exclude_patterns,
            PreferenceKey::RememberLastDirectory => self.prefs.remember_last_directory = defaults.remember_last_directory,
            PreferenceKey::LastOutputDirectory => self.prefs.last_output_directory = None,
        }

        self.save_or_warn();
    }

    /// Applies several key/value updates at once and saves.
    ///
    /// The patch is rejected as a whole if any key is unknown or any value
    /// has the wrong type; the in-memory record is then left untouched.
    pub fn set_many(&mut self, patch: Map<String, Value>) -> Result<(), InputError> {
        let mut updated = self.prefs.clone();
        for (name, value) in patch {
            let key = PreferenceKey::from_str(&name).map_err(|_| InputError::Preference(format!("unknown key '{name}'")))?;
            updated.apply(key, value).map_err(|e| InputError::Preference(format!("{name}: {e}")))?;
        }

        self.prefs = updated;
        self.save_or_warn();
        Ok(())
    }

    /// Typed single-field update followed by a save.
    pub fn update(&mut self, apply: impl FnOnce(&mut Preferences)) {
        apply(&mut self.prefs);
        self.save_or_warn();
    }

    /// Adds an exclusion pattern, ignoring blanks and duplicates.
    ///
    /// Returns whether the list changed.
    pub fn add_exclusion(&mut self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if pattern.is_empty() || self.prefs.exclude_patterns.iter().any(|p| p == pattern) {
            return false;
        }

        self.update(|prefs| prefs.exclude_patterns.push(pattern.to_owned()));
        true
    }

    /// Removes the exclusion at `index` (0-based) and returns it.
    pub fn remove_exclusion(&mut self, index: usize) -> Option<String> {
        if index >= self.prefs.exclude_patterns.len() {
            return None;
        }

        let removed = self.prefs.exclude_patterns.remove(index);
        self.save_or_warn();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json"));
        assert_eq!(store.get(), &Preferences::default());
    }

    #[test]
    fn test_reset_returns_exact_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path);
        store.update(|prefs| prefs.auto_open_after_extract = true);
        assert!(path.exists());

        store.reset().unwrap();
        assert!(!path.exists());
        assert_eq!(store.get(), &Preferences::default());
        assert_eq!(PreferenceStore::open(&path).get(), &Preferences::default());
    }

    #[test]
    fn test_set_many_persists_only_given_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path);
        store.reset().unwrap();

        store.set_many(patch(json!({ "compression_preset": "fast" }))).unwrap();

        let reloaded = PreferenceStore::open(&path);
        let expected = Preferences { compression_preset: CompressionPreset::Fast, ..Preferences::default() };
        assert_eq!(reloaded.get(), &expected);
    }

    #[test]
    fn test_set_many_rejects_bad_patch_atomically() {
        let dir = tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("prefs.json"));

        let err = store.set_many(patch(json!({ "compression_preset": "fast", "colour": "blue" }))).unwrap_err();
        assert!(matches!(err, InputError::Preference(_)));

        let err = store.set_many(patch(json!({ "custom_compression_level": 12 }))).unwrap_err();
        assert!(matches!(err, InputError::Preference(_)));

        assert_eq!(store.get(), &Preferences::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path);
        store.update(|prefs| {
            prefs.compression_preset = CompressionPreset::Custom;
            prefs.custom_compression_level = CompressionLevel::new(7).unwrap();
            prefs.exclude_patterns.push("*.tmp".into());
            prefs.last_output_directory = None;
        });

        let first = store.get().clone();
        store.save().unwrap();
        assert_eq!(PreferenceStore::open(&path).get(), &first);
    }

    #[test]
    fn test_partial_record_is_backfilled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{ "auto_open_after_extract": true, "future_option": 3 }"#).unwrap();

        let store = PreferenceStore::open(&path);
        assert!(store.get().auto_open_after_extract);
        assert_eq!(store.get().compression_preset, CompressionPreset::Balanced);
    }

    #[test]
    fn test_invalid_value_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let record = json!({
            "compression_preset": "ultra",
            "custom_compression_level": 12,
            "remember_last_directory": "yes",
            "default_output_directory": "/work/out",
            "auto_open_after_extract": true,
        });
        fs::write(&path, record.to_string()).unwrap();

        let prefs = load_from(&path).unwrap();
        let defaults = Preferences::default();
        assert_eq!(prefs.default_output_directory, PathBuf::from("/work/out"));
        assert!(prefs.auto_open_after_extract);
        assert_eq!(prefs.compression_preset, defaults.compression_preset);
        assert_eq!(prefs.custom_compression_level, defaults.custom_compression_level);
        assert_eq!(prefs.remember_last_directory, defaults.remember_last_directory);
    }

    #[test]
    fn test_malformed_record_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_from(&path), Err(PersistenceError::Parse { .. })));
        assert_eq!(PreferenceStore::open(&path).get(), &Preferences::default());
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("missing").join("prefs.json"));

        assert!(store.save().is_err());
        store.set_many(patch(json!({ "auto_open_after_extract": true }))).unwrap();
        assert!(store.get().auto_open_after_extract);
    }

    #[test]
    fn test_clear_last_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path);
        store.clear_one(PreferenceKey::LastOutputDirectory);

        assert_eq!(store.get().last_output_directory, None);
        assert_eq!(store.get().output_directory(), store.get().default_output_directory);
        assert_eq!(PreferenceStore::open(&path).get().last_output_directory, None);
    }

    #[test]
    fn test_output_directory_respects_remember_flag() {
        let mut prefs = Preferences { last_output_directory: Some(PathBuf::from("/work/out")), ..Preferences::default() };
        assert_eq!(prefs.output_directory(), Path::new("/work/out"));

        prefs.remember_last_directory = false;
        assert_eq!(prefs.output_directory(), prefs.default_output_directory);
    }

    #[test]
    fn test_exclusion_editing() {
        let dir = tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("prefs.json"));

        assert!(store.add_exclusion("*.log"));
        assert!(!store.add_exclusion("*.log"));
        assert!(!store.add_exclusion("   "));
        assert_eq!(store.get().exclude_patterns.last().map(String::as_str), Some("*.log"));

        assert_eq!(store.remove_exclusion(0).as_deref(), Some(".DS_Store"));
        assert_eq!(store.remove_exclusion(99), None);

        store.clear_one(PreferenceKey::ExcludePatterns);
        assert_eq!(store.get().exclude_patterns, DEFAULT_EXCLUDE_PATTERNS);
    }

    #[test]
    fn test_key_names_match_record() {
        let record = serde_json::to_value(Preferences::default()).unwrap();
        for key in <PreferenceKey as strum::IntoEnumIterator>::iter() {
            assert!(record.get(key.as_str()).is_some(), "{}", key.as_str());
        }
    }
}
