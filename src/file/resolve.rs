//! Raw input to path candidates.
//!
//! Terminals escape spaces and a few punctuation characters when a file is
//! dragged in, and users quote paths by hand. Every raw token therefore has
//! two forms: the cleaned original and the unescaped variant. Resolution
//! tries them in that fixed order.

use std::path::{Path, PathBuf};

/// Characters a terminal may prefix with a backslash.
const ESCAPABLE: &[char] = &[' ', '(', ')', '&'];

/// Quote characters stripped from both ends of a raw path.
const QUOTES: &[char] = &['"', '\''];

/// A user-entered path and the forms it may resolve through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCandidate {
    raw: String,
    original: String,
    unescaped: String,
}

impl PathCandidate {
    pub fn new(raw: &str) -> Self {
        let (original, unescaped) = resolve(raw);
        Self { raw: raw.to_owned(), original, unescaped }
    }

    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn unescaped(&self) -> &str {
        &self.unescaped
    }

    /// Forms in resolution order, without repeating an identical form.
    pub fn forms(&self) -> Vec<&str> {
        let mut forms = vec![self.original.as_str()];
        if self.unescaped != self.original {
            forms.push(self.unescaped.as_str());
        }
        forms
    }

    /// Returns the first form that exists on disk.
    ///
    /// The original form wins even when both exist and differ.
    pub fn locate(&self) -> Option<PathBuf> {
        self.forms().into_iter().map(Path::new).find(|p| p.exists()).map(Path::to_path_buf)
    }

    /// The form used when the path is a destination that may not exist yet.
    #[inline]
    pub fn destination(&self) -> PathBuf {
        PathBuf::from(&self.unescaped)
    }
}

/// Cleans a raw path and derives its `(original, unescaped)` forms.
pub fn resolve(raw: &str) -> (String, String) {
    let cleaned = raw.trim().trim_matches(QUOTES).to_owned();
    let unescaped = unescape(&cleaned);
    (cleaned, unescaped)
}

/// Removes a single backslash in front of each escapable character.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && ESCAPABLE.contains(&next)
        {
            continue;
        }
        out.push(c);
    }

    out
}

/// Splits a line of input into path tokens.
///
/// Whitespace separates tokens unless it is quoted or backslash-escaped.
/// Quotes are removed; backslash escapes are kept so both forms can still be
/// derived from each token. An unterminated quote falls back to a plain
/// whitespace split.
pub fn split_input(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return line.split_whitespace().map(str::to_owned).collect();
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_resolve_strips_quotes_and_unescapes() {
        let (original, unescaped) = resolve("  '/Users/me/My\\ Files\\ \\(old\\)\\ \\&\\ more'  ");
        assert_eq!(original, "/Users/me/My\\ Files\\ \\(old\\)\\ \\&\\ more");
        assert_eq!(unescaped, "/Users/me/My Files (old) & more");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let input = "\"/tmp/a\\ b\"";
        assert_eq!(resolve(input), resolve(input));
    }

    #[test]
    fn test_unescape_removes_only_one_backslash() {
        assert_eq!(unescape("a\\\\ b"), "a\\ b");
        assert_eq!(unescape("c:\\dir\\file"), "c:\\dir\\file");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_candidate_forms_are_deduplicated() {
        let plain = PathCandidate::new("/tmp/plain");
        assert_eq!(plain.forms(), vec!["/tmp/plain"]);

        let escaped = PathCandidate::new("/tmp/a\\ b");
        assert_eq!(escaped.forms(), vec!["/tmp/a\\ b", "/tmp/a b"]);
    }

    #[test]
    fn test_locate_falls_back_to_unescaped() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("my file.txt");
        std::fs::write(&real, b"x").unwrap();

        let raw = format!("{}/my\\ file.txt", dir.path().display());
        assert_eq!(PathCandidate::new(&raw).locate(), Some(real));
    }

    #[test]
    fn test_locate_prefers_original() {
        let dir = tempdir().unwrap();
        let escaped = dir.path().join("a\\ b");
        let unescaped = dir.path().join("a b");
        std::fs::write(&escaped, b"1").unwrap();
        std::fs::write(&unescaped, b"2").unwrap();

        let raw = format!("{}/a\\ b", dir.path().display());
        assert_eq!(PathCandidate::new(&raw).locate(), Some(escaped));
    }

    #[test]
    fn test_split_input() {
        assert_eq!(split_input("a b  c"), vec!["a", "b", "c"]);
        assert_eq!(split_input("\"with space.txt\" other"), vec!["with space.txt", "other"]);
        assert_eq!(split_input("/x/My\\ Doc.pdf /y"), vec!["/x/My\\ Doc.pdf", "/y"]);
        assert_eq!(split_input("'unterminated one"), vec!["'unterminated", "one"]);
        assert!(split_input("   ").is_empty());
    }
}
