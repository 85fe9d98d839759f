use std::path::{Component, Path, PathBuf};

use fast_glob::glob_match;
use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::config::{DENIED_OUTPUT_PREFIXES, DENIED_PREFIXES, TRUNCATION_SAFE_ENDINGS, TRUNCATION_THRESHOLD};
use crate::file::resolve::PathCandidate;

/// Ordered, duplicate-free list of absolute paths that existed when validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedFileSet {
    paths: Vec<PathBuf>,
}

impl ValidatedFileSet {
    #[inline]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Appends another set, keeping first occurrences only.
    pub fn extend(&mut self, other: Self) {
        for path in other.paths {
            if !self.paths.contains(&path) {
                self.paths.push(path);
            }
        }
    }
}

/// Why a candidate was dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No form of the candidate exists; `tried` lists the forms in order.
    NotFound { raw: String, tried: Vec<String> },

    /// The resolved path lies under a protected prefix.
    Denied { path: PathBuf },

    /// The resolved path was already accepted.
    Duplicate { path: PathBuf },
}

/// Result of validating a batch of candidates.
#[derive(Debug, Default)]
pub struct Validation {
    pub files: ValidatedFileSet,
    pub rejected: Vec<Rejection>,
}

/// Resolves every candidate to an existing absolute path.
///
/// Candidates that cannot be found, that resolve under a protected prefix, or
/// that repeat an earlier path are reported and dropped; the batch itself
/// never fails.
pub fn validate_existing<S: AsRef<str>>(candidates: &[S]) -> Validation {
    let mut seen = HashSet::new();
    let mut validation = Validation::default();

    for raw in candidates.iter().map(AsRef::as_ref).filter(|raw| !raw.trim().is_empty()) {
        let candidate = PathCandidate::new(raw);

        let Some(found) = candidate.locate() else {
            warn!(path = %candidate.original(), "path not found");
            let tried = candidate.forms().into_iter().map(str::to_owned).collect();
            validation.rejected.push(Rejection::NotFound { raw: raw.to_owned(), tried });
            continue;
        };

        let absolute = normalize(&found);

        if is_denied(&absolute) {
            warn!(path = %absolute.display(), "skipping protected system path");
            validation.rejected.push(Rejection::Denied { path: absolute });
            continue;
        }

        if !seen.insert(absolute.clone()) {
            debug!(path = %absolute.display(), "skipping duplicate path");
            validation.rejected.push(Rejection::Duplicate { path: absolute });
            continue;
        }

        validation.files.paths.push(absolute);
    }

    validation
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
///
/// `..` at the root stays at the root. Symlinks are not followed.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.parent().is_some() {
                    normalized.pop();
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Whether a path lies under one of the protected source prefixes.
pub fn is_denied(path: &Path) -> bool {
    DENIED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Whether a path may not receive a new archive.
pub fn is_denied_output(path: &Path) -> bool {
    DENIED_OUTPUT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Heuristic for terminal input truncation.
///
/// Advisory only: callers ask the user before continuing.
pub fn flag_suspicious_length(input: &str) -> bool {
    input.chars().count() > TRUNCATION_THRESHOLD && !input.ends_with(TRUNCATION_SAFE_ENDINGS)
}

/// Whether a file name matches any of the exclusion patterns.
pub fn is_excluded<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|pattern| glob_match(pattern.as_ref(), name))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_validate_drops_missing_and_keeps_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let missing = dir.path().join("missing.txt");
        let inputs = [b.display().to_string(), missing.display().to_string(), a.display().to_string()];
        let validation = validate_existing(&inputs);

        assert_eq!(validation.files.paths(), &[b, a]);
        assert!(matches!(&validation.rejected[..], [Rejection::NotFound { .. }]));
    }

    #[test]
    fn test_validate_never_returns_duplicates() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("same file.txt");
        std::fs::write(&a, b"a").unwrap();

        let plain = a.display().to_string();
        let escaped = plain.replace(' ', "\\ ");
        let quoted = format!("\"{plain}\"");
        let validation = validate_existing(&[plain, escaped, quoted]);

        assert_eq!(validation.files.len(), 1);
        assert_eq!(validation.rejected.len(), 2);
    }

    #[test]
    fn test_denied_prefixes() {
        assert!(is_denied(Path::new("/System/Library/x")));
        assert!(is_denied(Path::new("/usr/bin/ls")));
        assert!(is_denied(Path::new("/private/var/tmp")));
        assert!(!is_denied(Path::new("/privateer/notes")));
        assert!(!is_denied(Path::new("/Users/me/System")));
        assert!(is_denied_output(Path::new("/System/out.7z")));
        assert!(!is_denied_output(Path::new("/private/out.7z")));
    }

    #[test]
    fn test_validate_rejects_denied_paths() {
        // Either missing on this host or denied; never accepted.
        let validation = validate_existing(&["/usr/bin"]);
        assert!(validation.files.is_empty());
    }

    #[test]
    fn test_normalize_folds_parent_components() {
        assert_eq!(normalize(Path::new("/tmp/../usr/bin/env")), PathBuf::from("/usr/bin/env"));
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
        assert!(normalize(Path::new("relative/x")).is_absolute());
    }

    #[test]
    fn test_validate_rejects_denied_paths_behind_parent_components() {
        let validation = validate_existing(&["/tmp/../usr/bin/env", "/tmp/../usr"]);
        assert!(validation.files.is_empty());
        for rejection in &validation.rejected {
            if let Rejection::Denied { path } = rejection {
                assert!(path.starts_with("/usr"));
            }
        }
    }

    #[test]
    fn test_validate_dedups_paths_with_parent_components() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"a").unwrap();

        let detour = dir.path().join("sub").join("..").join("a.txt");
        let validation = validate_existing(&[a.display().to_string(), detour.display().to_string()]);

        assert_eq!(validation.files.paths(), &[normalize(&a)]);
        assert!(matches!(&validation.rejected[..], [Rejection::Duplicate { .. }]));
    }

    #[test]
    fn test_flag_suspicious_length() {
        let long = "a".repeat(TRUNCATION_THRESHOLD + 1);
        assert!(flag_suspicious_length(&long));
        assert!(!flag_suspicious_length(&format!("{long}/")));
        assert!(!flag_suspicious_length(&format!("{long} ")));
        assert!(!flag_suspicious_length(&"a".repeat(TRUNCATION_THRESHOLD)));
    }

    #[test]
    fn test_is_excluded() {
        let patterns = [".DS_Store", "*.tmp"];
        assert!(is_excluded(".DS_Store", &patterns));
        assert!(is_excluded("scratch.tmp", &patterns));
        assert!(!is_excluded("photo.jpg", &patterns));
    }

    #[test]
    fn test_extend_keeps_first_occurrence() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        let mut first = validate_existing(&[a.display().to_string()]).files;
        first.extend(validate_existing(&[b.display().to_string(), a.display().to_string()]).files);
        assert_eq!(first.paths(), &[a, b]);
    }
}
