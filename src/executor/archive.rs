//! Archive-move operations
//!
//! Anything the sync would overwrite or delete is first renamed into
//! `.kitchensync/<run timestamp>/` next to the affected file. The rename is
//! a metadata-only move within one filesystem and therefore atomic; a
//! cross-filesystem copy-then-delete fallback is deliberately absent, since
//! it would reintroduce the data-loss window the archive exists to close.

use crate::types::SyncErrorKind;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Archive directory name; pinned: never listed, compared, or deleted.
pub const ARCHIVE_DIR_NAME: &str = ".kitchensync";

/// Audit file maintained inside each per-run archive directory.
pub const MANIFEST_NAME: &str = "MANIFEST.json";

/// Mint the per-run archive timestamp: `YYYY-MM-DD_HH-MM-SS.mmm`.
///
/// Hyphens stand in for colons because the string becomes a directory name
/// and Windows forbids `:` in file names. Milliseconds keep adjacent runs
/// from colliding. One sync run mints exactly one of these and reuses it
/// for every archive it creates.
pub fn run_timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S%.3f").to_string()
}

/// Where `target` would be archived during the run stamped `timestamp`.
pub fn archive_path_for(target: &Path, timestamp: &str) -> PathBuf {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target.file_name().unwrap_or_else(|| target.as_os_str());
    parent.join(ARCHIVE_DIR_NAME).join(timestamp).join(name)
}

/// Move `target` (file or whole directory subtree) into the run's archive.
///
/// Fails with `NotFound` when the target vanished first; callers decide
/// whether that matters. Never copies: if the rename fails the target is
/// left untouched and the error surfaces, so no overwrite will follow.
pub fn archive_entry(target: &Path, timestamp: &str) -> Result<PathBuf, SyncErrorKind> {
    let metadata = fs::symlink_metadata(target)?;

    let archived = archive_path_for(target, timestamp);
    let archive_dir = archived
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    fs::create_dir_all(&archive_dir)?;
    fs::rename(target, &archived)?;

    record_archived(&archive_dir, target, &archived, metadata.len());
    Ok(archived)
}

/// Reverse an archive move, putting the preserved content back in place.
/// Used by the post-copy rollback path.
pub fn restore_archived(archived: &Path, original: &Path) -> Result<(), SyncErrorKind> {
    fs::rename(archived, original)?;
    if let Some(archive_dir) = archived.parent() {
        forget_archived(archive_dir, archived);
    }
    Ok(())
}

/// One preserved entry, as recorded in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedFile {
    /// Absolute path the entry was archived from
    pub original_path: String,

    /// Leaf name inside the archive directory
    pub archived_name: String,

    /// RFC 3339 wall-clock time of the archive move
    pub archived_at: String,

    /// Size in bytes at archive time
    pub size: u64,
}

/// Per-run audit manifest, one per archive directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub entries: Vec<ArchivedFile>,
}

impl ArchiveManifest {
    /// Read the manifest of an archive directory; missing or unparsable
    /// manifests read as empty.
    pub fn load(archive_dir: &Path) -> Self {
        fs::read_to_string(archive_dir.join(MANIFEST_NAME))
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn store(&self, archive_dir: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = fs::write(archive_dir.join(MANIFEST_NAME), json);
        }
    }
}

// The manifest is best-effort audit metadata. The rename above is the
// operation of record; a manifest write failure must not fail the archive.
fn record_archived(archive_dir: &Path, original: &Path, archived: &Path, size: u64) {
    let archived_name = match archived.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return,
    };
    let mut manifest = ArchiveManifest::load(archive_dir);
    manifest.entries.push(ArchivedFile {
        original_path: original.display().to_string(),
        archived_name,
        archived_at: Local::now().to_rfc3339(),
        size,
    });
    manifest.store(archive_dir);
}

fn forget_archived(archive_dir: &Path, archived: &Path) {
    let Some(name) = archived.file_name() else {
        return;
    };
    let name = name.to_string_lossy();
    let mut manifest = ArchiveManifest::load(archive_dir);
    manifest.entries.retain(|e| e.archived_name != name);
    manifest.store(archive_dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_timestamp_shape() {
        let ts = run_timestamp();
        assert_eq!(ts.len(), 23, "timestamp should be 23 bytes: {ts}");
        assert!(!ts.contains(':'), "no colons in filesystem names: {ts}");
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "_");
        assert_eq!(&ts[19..20], ".");
        assert!(ts[20..23].bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_archive_path_layout() {
        let archived = archive_path_for(Path::new("/data/dst/sub/file.txt"), "2024-01-15_14-30-00.123");
        assert_eq!(
            archived,
            Path::new("/data/dst/sub/.kitchensync/2024-01-15_14-30-00.123/file.txt")
        );
    }

    #[test]
    fn test_archive_moves_file_and_records_it() {
        let temp = TempDir::new().expect("create temp dir");
        let target = temp.path().join("victim.txt");
        fs::write(&target, b"precious").expect("write target");

        let ts = "2024-01-15_14-30-00.123";
        let archived = archive_entry(&target, ts).expect("archive");

        assert!(!target.exists(), "target should be gone");
        assert_eq!(fs::read(&archived).expect("read archived"), b"precious");
        assert_eq!(
            archived,
            temp.path().join(".kitchensync").join(ts).join("victim.txt")
        );

        let manifest = ArchiveManifest::load(archived.parent().expect("archive dir"));
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].archived_name, "victim.txt");
        assert_eq!(manifest.entries[0].size, 8);
    }

    #[test]
    fn test_archive_missing_target_is_not_found() {
        let temp = TempDir::new().expect("create temp dir");
        let err = archive_entry(&temp.path().join("gone.txt"), "2024-01-15_14-30-00.123")
            .unwrap_err();
        assert!(matches!(err, SyncErrorKind::NotFound));
    }

    #[test]
    fn test_archive_moves_whole_directory() {
        let temp = TempDir::new().expect("create temp dir");
        let target = temp.path().join("old-dir");
        fs::create_dir_all(target.join("nested")).expect("mkdir");
        fs::write(target.join("nested/leaf.txt"), b"leaf").expect("write leaf");

        let ts = "2024-01-15_14-30-00.123";
        let archived = archive_entry(&target, ts).expect("archive dir");

        assert!(!target.exists());
        assert_eq!(
            fs::read(archived.join("nested/leaf.txt")).expect("read leaf"),
            b"leaf"
        );
    }

    #[test]
    fn test_restore_round_trip_prunes_manifest() {
        let temp = TempDir::new().expect("create temp dir");
        let target = temp.path().join("victim.txt");
        fs::write(&target, b"precious").expect("write target");

        let ts = "2024-01-15_14-30-00.123";
        let archived = archive_entry(&target, ts).expect("archive");
        restore_archived(&archived, &target).expect("restore");

        assert_eq!(fs::read(&target).expect("read restored"), b"precious");
        assert!(!archived.exists());

        let manifest = ArchiveManifest::load(archived.parent().expect("archive dir"));
        assert!(manifest.entries.is_empty());
    }

    #[test]
    fn test_same_run_reuses_one_archive_directory() {
        let temp = TempDir::new().expect("create temp dir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write a");
        fs::write(temp.path().join("b.txt"), b"b").expect("write b");

        let ts = "2024-01-15_14-30-00.123";
        archive_entry(&temp.path().join("a.txt"), ts).expect("archive a");
        archive_entry(&temp.path().join("b.txt"), ts).expect("archive b");

        let runs: Vec<_> = fs::read_dir(temp.path().join(ARCHIVE_DIR_NAME))
            .expect("read archive root")
            .collect();
        assert_eq!(runs.len(), 1, "one run directory for one timestamp");

        let manifest = ArchiveManifest::load(&temp.path().join(ARCHIVE_DIR_NAME).join(ts));
        assert_eq!(manifest.entries.len(), 2);
    }
}
