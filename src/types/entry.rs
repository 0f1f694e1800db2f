//! Entry - one child of a listed directory

/// Metadata for a single directory child, as returned by the scanner.
///
/// An `Entry` carries the leaf name only (never a path), the size in bytes
/// (0 for directories), and the last-modified time truncated to whole unix
/// seconds. Entries live inside the batch that produced them and are freed
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Leaf file name, no path separators
    pub name: String,

    /// Size in bytes; always 0 for directories
    pub size: u64,

    /// Modification time in whole seconds since the unix epoch.
    /// 0 is permitted for directories whose stat failed.
    pub mtime: i64,

    /// Directory flag
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self {
            name: name.into(),
            size,
            mtime,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>, mtime: i64) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mtime,
            is_dir: true,
        }
    }
}

/// Locate an entry by name in a batch sorted by `Entry::name`.
pub fn find_entry<'a>(batch: &'a [Entry], name: &str) -> Option<&'a Entry> {
    batch
        .binary_search_by(|e| e.name.as_str().cmp(name))
        .ok()
        .map(|idx| &batch[idx])
}
