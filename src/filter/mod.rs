//! Exclusion filter: glob patterns evaluated against root-relative paths

mod timestamp;

pub use timestamp::is_timestamp_like;

use crate::types::SyncErrorKind;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

/// A compiled set of exclude patterns anchored at one tree root.
///
/// `matches` relativizes the candidate against the root and evaluates the
/// pattern set against that relative path. Paths outside the root never
/// match. The filter holds no per-path state.
///
/// Pattern syntax is the usual glob family: `?` and `*` do not cross path
/// separators, `**` does, character classes support ranges and negation,
/// and `{a,b}` alternation is expanded. Matching is byte-exact.
#[derive(Debug)]
pub struct GlobFilter {
    root: PathBuf,
    set: GlobSet,
}

impl GlobFilter {
    /// Compile `patterns` against `root`.
    ///
    /// Malformed patterns (unclosed `[` or `{`) fail here, before any
    /// traversal starts.
    pub fn new(root: &Path, patterns: &[String]) -> Result<Self, SyncErrorKind> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| SyncErrorKind::BadPattern(format!("{pattern}: {e}")))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| SyncErrorKind::BadPattern(e.to_string()))?;

        Ok(Self {
            root: root.to_path_buf(),
            set,
        })
    }

    /// True when the path lies under the root and any pattern matches its
    /// root-relative form.
    pub fn matches(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(relative) => self.set.is_match(relative),
            Err(_) => false,
        }
    }
}
