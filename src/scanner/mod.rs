//! Directory lister: one directory's children as a single sorted batch
//!
//! The engine asks for one directory at a time; peak memory is bounded by
//! the largest single directory, not by tree size. On Windows the batched
//! `FindFirstFileW` enumeration is used so that name, size, mtime and type
//! arrive in one record per child, instead of an open+stat pair that costs
//! two antivirus scans and two kernel transitions per file.

#[cfg(windows)]
mod windows;

use crate::types::{Entry, SyncErrorKind};
use std::path::Path;

/// List the children of `dir` as a batch sorted byte-lexicographically by
/// name.
///
/// Symbolic links (and, on Windows, reparse points generally) are skipped
/// outright; the sync never follows links, which also removes the only
/// natural source of traversal cycles. Fails with `NotFound` or
/// `AccessDenied` when the directory itself cannot be enumerated.
pub fn list_directory(dir: &Path) -> Result<Vec<Entry>, SyncErrorKind> {
    let mut batch = platform_list(dir)?;
    batch.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(batch)
}

#[cfg(windows)]
fn platform_list(dir: &Path) -> Result<Vec<Entry>, SyncErrorKind> {
    windows::list_directory(dir)
}

#[cfg(not(windows))]
fn platform_list(dir: &Path) -> Result<Vec<Entry>, SyncErrorKind> {
    use filetime::FileTime;

    let reader = std::fs::read_dir(dir).map_err(SyncErrorKind::classify)?;
    let mut batch = Vec::new();

    for child in reader {
        // Children that vanish or turn unreadable mid-listing are dropped;
        // the engine treats them like any other listing race.
        let Ok(child) = child else { continue };
        let Ok(file_type) = child.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            continue;
        }
        let Ok(name) = child.file_name().into_string() else {
            continue;
        };

        if file_type.is_dir() {
            // A directory stat can fail (permissions) and still be listed.
            let mtime = child
                .metadata()
                .map(|m| FileTime::from_last_modification_time(&m).unix_seconds())
                .unwrap_or(0);
            batch.push(Entry::dir(name, mtime));
        } else {
            let Ok(metadata) = child.metadata() else {
                continue;
            };
            let mtime = FileTime::from_last_modification_time(&metadata).unix_seconds();
            batch.push(Entry::file(name, metadata.len(), mtime));
        }
    }

    Ok(batch)
}
