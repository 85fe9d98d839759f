use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{InputError, Result};
use crate::file::resolve::PathCandidate;
use crate::file::validation::is_excluded;

/// Byte and file totals of a set of sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSize {
    pub bytes: u64,
    pub files: u64,
}

/// Sums the size of every regular file under the sources.
///
/// Unreadable entries are skipped; files whose name matches an exclusion
/// pattern are not counted since the archiver will leave them out.
pub fn source_size<P: AsRef<Path>, S: AsRef<str>>(sources: &[P], exclusions: &[S]) -> SourceSize {
    let mut total = SourceSize::default();

    for source in sources {
        for entry in WalkDir::new(source.as_ref()).into_iter().filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            if is_excluded(&entry.file_name().to_string_lossy(), exclusions) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) => {
                    total.bytes += meta.len();
                    total.files += 1;
                }
                Err(e) => debug!(path = %entry.path().display(), error = %e, "skipping unreadable entry"),
            }
        }
    }

    total
}

/// Reads a text file holding one path per line.
///
/// Blank lines are ignored; the list file itself may be given escaped.
pub fn load_file_list(raw: &str) -> Result<Vec<String>> {
    let candidate = PathCandidate::new(raw);
    let path = candidate.locate().ok_or_else(|| InputError::NotFound(candidate.original().to_owned()))?;
    let content = fs::read_to_string(&path)?;

    Ok(content.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_owned).collect())
}

/// Whether a directory exists and contains at least one entry.
pub fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

/// File name without its final extension, falling back to the whole path.
pub fn stem_of(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

/// Final path component, falling back to the whole path.
pub fn name_of(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
