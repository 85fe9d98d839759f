//! Default archive names derived from the sources.
//!
//! A single source is named after itself. Several sources are classified by
//! an ordered rule table; the first rule any source name matches wins, and a
//! common parent directory (or a fixed fallback) is used when none does.

use std::path::Path;

use time::{Date, OffsetDateTime, UtcOffset};

use crate::config::DEFAULT_EXTENSION;
use crate::file::{name_of, stem_of};

/// Category name used when the sources share nothing.
pub const MIXED_CATEGORY: &str = "Mixed_Files";

/// Category name used when the common parent has no name of its own.
pub const ROOT_CATEGORY: &str = "Files";

/// One classification rule.
#[derive(Debug, Clone, Copy)]
pub struct NamingRule {
    pub category: &'static str,
    /// Case-insensitive substrings of a file name.
    pub keywords: &'static [&'static str],
    /// Case-insensitive file name suffixes.
    pub suffixes: &'static [&'static str],
}

impl NamingRule {
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k)) || self.suffixes.iter().any(|s| name.ends_with(s))
    }
}

/// Rules in evaluation order.
pub const NAMING_RULES: &[NamingRule] = &[
    NamingRule { category: "Photos", keywords: &["photo", "img"], suffixes: &[".jpg", ".png", ".gif", ".heic"] },
    NamingRule { category: "Documents", keywords: &["doc"], suffixes: &[".pdf", ".txt", ".docx", ".pages"] },
    NamingRule { category: "Videos", keywords: &["video", "movie"], suffixes: &[".mp4", ".mov", ".avi"] },
    NamingRule { category: "Audio", keywords: &["music", "audio"], suffixes: &[".mp3", ".m4a", ".wav"] },
    NamingRule { category: "Project", keywords: &["project", "src", "code"], suffixes: &[] },
];

/// Category for a group of sources.
pub fn classify<P: AsRef<Path>>(sources: &[P]) -> String {
    let names: Vec<String> = sources.iter().map(|s| name_of(s.as_ref())).collect();

    if let Some(rule) = NAMING_RULES.iter().find(|rule| names.iter().any(|name| rule.matches(name))) {
        return rule.category.to_owned();
    }

    let Some(parent) = sources.first().and_then(|first| first.as_ref().parent()) else {
        return MIXED_CATEGORY.to_owned();
    };

    if parent.as_os_str().is_empty() || !sources.iter().all(|s| s.as_ref().starts_with(parent)) {
        return MIXED_CATEGORY.to_owned();
    }

    parent.file_name().map_or_else(|| ROOT_CATEGORY.to_owned(), |name| name.to_string_lossy().into_owned())
}

/// Suggested archive file name for the sources, dated `today` when there are several.
pub fn smart_archive_name<P: AsRef<Path>>(sources: &[P], today: Date) -> String {
    match sources {
        [] => format!("archive{DEFAULT_EXTENSION}"),
        [single] => {
            let path = single.as_ref();
            if path.is_dir() { format!("{}{DEFAULT_EXTENSION}", name_of(path)) } else { format!("{}_archive{DEFAULT_EXTENSION}", stem_of(path)) }
        }
        many => format!("{}_{}{DEFAULT_EXTENSION}", classify(many), date_stamp(today)),
    }
}

/// `YYYY-MM-DD`.
pub fn date_stamp(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

/// The local UTC offset, or UTC when it cannot be determined.
///
/// Must be read while the process is single-threaded; on Unix the lookup
/// fails once other threads exist.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Calendar date at `offset`.
pub fn today_in(offset: UtcOffset) -> Date {
    OffsetDateTime::now_utc().to_offset(offset).date()
}
