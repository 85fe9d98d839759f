//! Parsing of the archiver's technical listing (`l -slt`).

/// One entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveEntry {
    pub path: String,
    pub size: u64,
    pub is_folder: bool,
}

/// Separator between the archive's own properties and its entries.
const ENTRIES_SEPARATOR: &str = "----------";

/// Parses `Path = `, `Size = ` and `Folder = ` lines into entries.
///
/// Each `Path = ` line opens a new entry. When the listing contains the
/// separator line, the block above it describes the archive itself and is
/// skipped. Sizes that are not plain digits read as zero.
pub fn parse_technical_listing(text: &str) -> Vec<ArchiveEntry> {
    let body = match text.split_once(ENTRIES_SEPARATOR) {
        Some((_, entries)) => entries,
        None => text,
    };

    let mut entries = Vec::new();
    let mut current: Option<ArchiveEntry> = None;

    for line in body.lines().map(|line| line.trim_end_matches('\r')) {
        if let Some(path) = property(line, "Path") {
            push_named(&mut entries, current.take());
            current = Some(ArchiveEntry { path: path.to_owned(), ..ArchiveEntry::default() });
        } else if let Some(entry) = current.as_mut() {
            if let Some(size) = property(line, "Size") {
                entry.size = size.trim().parse().unwrap_or(0);
            } else if let Some(folder) = property(line, "Folder") {
                entry.is_folder = folder.trim() == "+";
            }
        }
    }

    push_named(&mut entries, current);
    entries
}

/// Value of a `Key = value` line, kept verbatim apart from the single space after `=`.
fn property<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.strip_prefix(" =")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn push_named(entries: &mut Vec<ArchiveEntry>, entry: Option<ArchiveEntry>) {
    entries.extend(entry.filter(|entry| !entry.path.is_empty()));
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
7-Zip (z) 23.01 (arm64) : Copyright (c) 1999-2023 Igor Pavlov : 2023-06-20

Listing archive: photos.7z

--
Path = photos.7z
Type = 7z
Physical Size = 5120

----------
Path = photos
Size = 0
Folder = +
Attributes = D

Path = photos/beach.jpg
Size = 204800
Packed Size = 5000
Folder = -

Path = photos/notes.txt
Size = n/a
Folder = -
";

    #[test]
    fn test_parses_entries_after_separator() {
        let entries = parse_technical_listing(LISTING);

        assert_eq!(
            entries,
            vec![
                ArchiveEntry { path: "photos".into(), size: 0, is_folder: true },
                ArchiveEntry { path: "photos/beach.jpg".into(), size: 204_800, is_folder: false },
                ArchiveEntry { path: "photos/notes.txt".into(), size: 0, is_folder: false },
            ]
        );
    }

    #[test]
    fn test_parses_without_separator() {
        let entries = parse_technical_listing("Path = a.txt\nSize = 12\nFolder = -\nPath = b\nFolder = +\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].size, 12);
        assert!(entries[1].is_folder);
    }

    #[test]
    fn test_path_keeps_surrounding_spaces() {
        let entries = parse_technical_listing("Path =  padded name.txt \r\nSize = 3\r\nFolder = -\r\n");
        assert_eq!(entries, vec![ArchiveEntry { path: " padded name.txt ".into(), size: 3, is_folder: false }]);
    }

    #[test]
    fn test_unnamed_entries_are_dropped() {
        let entries = parse_technical_listing("Path = \nSize = 1\nPath = kept.txt\nSize = 2\nPath =\n");
        assert_eq!(entries, vec![ArchiveEntry { path: "kept.txt".into(), size: 2, is_folder: false }]);
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_technical_listing("").is_empty());
        assert!(parse_technical_listing("Size = 4\n").is_empty());
    }
}
