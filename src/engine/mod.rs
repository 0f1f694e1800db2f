//! Recursive sync engine
//!
//! Walks the source tree one directory at a time, comparing each sorted
//! batch of children against the matching destination batch and acting on
//! the differences: copy what is new, archive-then-update what changed,
//! archive what only the destination has. Per-entry failures are recorded
//! and the traversal moves on; only an unreadable tree root or a malformed
//! exclude pattern aborts the run.
//!
//! The engine is single-threaded. The only concurrency in the whole
//! program lives inside the copy watchdog, one worker at a time.

mod compare;

pub use compare::decide;

use crate::config::Config;
use crate::executor::{archive, copy_file};
use crate::filter::{is_timestamp_like, GlobFilter};
use crate::scanner::list_directory;
use crate::types::{find_entry, Entry, SyncAction, SyncError, SyncErrorKind, SyncStats};
use crate::ui::EventLog;
use filetime::FileTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of one sync run: counters plus every recorded failure, in the
/// order the failures were hit.
#[derive(Debug)]
pub struct SyncReport {
    pub stats: SyncStats,
    pub errors: Vec<SyncError>,
}

/// Run one source → destination sync described by `config`.
pub fn sync(config: &Config) -> Result<SyncReport, SyncErrorKind> {
    Syncer::new(config)?.run()
}

struct Syncer<'a> {
    config: &'a Config,
    src_filter: GlobFilter,
    dst_filter: GlobFilter,
    log: EventLog,
    run_timestamp: String,
    stats: SyncStats,
    errors: Vec<SyncError>,
}

impl<'a> Syncer<'a> {
    fn new(config: &'a Config) -> Result<Self, SyncErrorKind> {
        // Patterns are compiled once, against each root, before anything is
        // touched; a bad pattern aborts here.
        let src_filter = GlobFilter::new(&config.source, &config.exclude_patterns)?;
        let dst_filter = GlobFilter::new(&config.destination, &config.exclude_patterns)?;

        Ok(Self {
            config,
            src_filter,
            dst_filter,
            log: EventLog::new(config.verbosity, &config.source, &config.destination),
            run_timestamp: archive::run_timestamp(),
            stats: SyncStats::default(),
            errors: Vec::new(),
        })
    }

    fn run(mut self) -> Result<SyncReport, SyncErrorKind> {
        self.check_roots()?;

        let src_root = self.config.source.clone();
        let dst_root = self.config.destination.clone();
        self.sync_dir(&src_root, &dst_root)
            .map_err(|(dir, kind)| {
                SyncErrorKind::RootInaccessible(format!("{}: {kind}", dir.display()))
            })?;

        self.stats.errors = self.errors.len();
        Ok(SyncReport {
            stats: self.stats,
            errors: self.errors,
        })
    }

    fn check_roots(&self) -> Result<(), SyncErrorKind> {
        let src = &self.config.source;
        match fs::metadata(src) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SyncErrorKind::RootInaccessible(format!(
                    "source is not a directory: {}",
                    src.display()
                )))
            }
            Err(e) => {
                return Err(SyncErrorKind::RootInaccessible(format!(
                    "source {}: {}",
                    src.display(),
                    SyncErrorKind::classify(e)
                )))
            }
        }

        let dst = &self.config.destination;
        if !dst.exists() {
            let parent_exists = dst.parent().map(Path::exists).unwrap_or(false);
            if !parent_exists {
                return Err(SyncErrorKind::RootInaccessible(format!(
                    "destination parent does not exist: {}",
                    dst.display()
                )));
            }
            if !self.config.preview {
                fs::create_dir_all(dst).map_err(|e| {
                    SyncErrorKind::RootInaccessible(format!(
                        "destination {}: {}",
                        dst.display(),
                        SyncErrorKind::classify(e)
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Mirror one directory pair. `Err` means a batch could not be listed;
    /// the caller decides whether that is fatal (roots) or recordable
    /// (subdirectories).
    fn sync_dir(&mut self, src_dir: &Path, dst_dir: &Path) -> Result<(), (PathBuf, SyncErrorKind)> {
        self.log.loading(src_dir);
        let src_batch = list_directory(src_dir).map_err(|k| (src_dir.to_path_buf(), k))?;

        self.log.loading(dst_dir);
        let dst_batch = match list_directory(dst_dir) {
            Ok(batch) => batch,
            // Not created yet (first run, or preview): nothing on this side.
            Err(SyncErrorKind::NotFound) => Vec::new(),
            Err(kind) => return Err((dst_dir.to_path_buf(), kind)),
        };

        for entry in src_batch.iter().filter(|e| !e.is_dir) {
            self.sync_file_entry(src_dir, dst_dir, entry, &dst_batch);
        }

        for entry in src_batch.iter().filter(|e| e.is_dir) {
            self.sync_dir_entry(src_dir, dst_dir, entry, &dst_batch);
        }

        self.delete_pass(dst_dir, &src_batch, &dst_batch);

        Ok(())
    }

    fn sync_file_entry(
        &mut self,
        src_dir: &Path,
        dst_dir: &Path,
        entry: &Entry,
        dst_batch: &[Entry],
    ) {
        if entry.name == archive::ARCHIVE_DIR_NAME {
            return;
        }
        let src_path = src_dir.join(&entry.name);
        if self.src_filter.matches(&src_path) {
            return;
        }
        if self.config.skip_timestamps && is_timestamp_like(&entry.name) {
            return;
        }

        let dst_path = dst_dir.join(&entry.name);
        let dest = find_entry(dst_batch, &entry.name);

        match decide(entry, dest, self.config.use_modtime) {
            SyncAction::Copy => self.copy_new(&src_path, &dst_path),
            SyncAction::Update => self.update_existing(&src_path, &dst_path),
            _ => self.leave_unchanged(entry, dest, &src_path, &dst_path),
        }
    }

    fn copy_new(&mut self, src_path: &Path, dst_path: &Path) {
        self.log.copying(src_path);
        if self.config.preview {
            self.stats.files_copied += 1;
            return;
        }
        if let Ok(bytes) = self.copy_and_verify(src_path, dst_path, None) {
            self.stats.files_copied += 1;
            self.stats.bytes_copied += bytes;
        }
    }

    fn update_existing(&mut self, src_path: &Path, dst_path: &Path) {
        self.log.archiving(dst_path);
        if self.config.preview {
            self.log.copying(src_path);
            self.stats.files_updated += 1;
            return;
        }

        let archived = match archive::archive_entry(dst_path, &self.run_timestamp) {
            Ok(path) => Some(path),
            // The destination vanished between listing and now; nothing to
            // preserve, proceed as a plain copy.
            Err(SyncErrorKind::NotFound) => None,
            Err(kind) => {
                // Never overwrite content that was not preserved first.
                self.record(Some(src_path), Some(dst_path), "archiving", kind);
                return;
            }
        };

        self.log.copying(src_path);
        if let Ok(bytes) = self.copy_and_verify(src_path, dst_path, archived.as_deref()) {
            self.stats.files_updated += 1;
            self.stats.bytes_copied += bytes;
        }
    }

    /// Copy with the configured watchdog, then re-stat both sides and
    /// compare sizes. A mismatch rolls the destination back to the archived
    /// pre-state (when there is one) and records `SizeMismatch`.
    fn copy_and_verify(
        &mut self,
        src_path: &Path,
        dst_path: &Path,
        archived: Option<&Path>,
    ) -> Result<u64, ()> {
        let bytes = match copy_file(src_path, dst_path, self.config.abort_timeout) {
            Ok(bytes) => bytes,
            Err(kind) => {
                self.record(Some(src_path), Some(dst_path), SyncAction::Copy.label(), kind);
                return Err(());
            }
        };

        match verify_sizes(src_path, dst_path) {
            Ok(None) => Ok(bytes),
            Ok(Some((expected, actual))) => {
                self.log.rolling_back("removing failed copy");
                if let Err(e) = fs::remove_file(dst_path) {
                    if e.kind() != ErrorKind::NotFound {
                        self.record(
                            None,
                            Some(dst_path),
                            "rolling back",
                            SyncErrorKind::classify(e),
                        );
                    }
                }
                if let Some(archived) = archived {
                    self.log.rolling_back("restoring from archive");
                    if let Err(kind) = archive::restore_archived(archived, dst_path) {
                        self.record(None, Some(dst_path), "restoring from archive", kind);
                    }
                }
                self.record(
                    Some(src_path),
                    Some(dst_path),
                    "verifying size",
                    SyncErrorKind::SizeMismatch { expected, actual },
                );
                Err(())
            }
            Err(kind) => {
                self.record(Some(src_path), Some(dst_path), "verifying size", kind);
                Err(())
            }
        }
    }

    fn leave_unchanged(
        &mut self,
        entry: &Entry,
        dest: Option<&Entry>,
        src_path: &Path,
        dst_path: &Path,
    ) {
        self.stats.files_unchanged += 1;

        let Some(dest) = dest else { return };
        if dest.is_dir || dest.mtime == entry.mtime {
            return;
        }

        // Same content, drifted timestamp: re-stamp the destination so
        // later runs compare clean without a transfer.
        self.log.refreshing_mtime(dst_path);
        if self.config.preview {
            return;
        }
        let result = fs::metadata(src_path)
            .map(|m| FileTime::from_last_modification_time(&m))
            .and_then(|t| filetime::set_file_mtime(dst_path, t));
        if let Err(e) = result {
            self.record(
                Some(src_path),
                Some(dst_path),
                "updating modification time",
                SyncErrorKind::classify(e),
            );
        }
    }

    fn sync_dir_entry(
        &mut self,
        src_dir: &Path,
        dst_dir: &Path,
        entry: &Entry,
        dst_batch: &[Entry],
    ) {
        if entry.name == archive::ARCHIVE_DIR_NAME {
            return;
        }
        let src_path = src_dir.join(&entry.name);
        // Excluded directories are never entered; their children are never
        // listed.
        if self.src_filter.matches(&src_path) {
            return;
        }

        let dst_path = dst_dir.join(&entry.name);
        let dest = find_entry(dst_batch, &entry.name);

        // A destination file squatting on the directory name is archived
        // out of the way, never clobbered.
        if let Some(dest) = dest {
            if !dest.is_dir {
                self.log.archiving(&dst_path);
                if self.config.preview {
                    self.stats.files_deleted += 1;
                } else {
                    match archive::archive_entry(&dst_path, &self.run_timestamp) {
                        Ok(_) | Err(SyncErrorKind::NotFound) => self.stats.files_deleted += 1,
                        Err(kind) => {
                            self.record(None, Some(&dst_path), SyncAction::Delete.label(), kind);
                            return;
                        }
                    }
                }
            }
        }

        if dest.map_or(true, |d| !d.is_dir) {
            if !self.config.preview {
                if let Err(e) = fs::create_dir_all(&dst_path) {
                    self.record(
                        Some(&src_path),
                        Some(&dst_path),
                        SyncAction::CreateDir.label(),
                        SyncErrorKind::classify(e),
                    );
                    // Every child would fail the same way; move to the next
                    // sibling instead.
                    return;
                }
            }
            self.stats.dirs_created += 1;
        }

        if let Err((dir, kind)) = self.sync_dir(&src_path, &dst_path) {
            self.record(Some(&dir), None, "loading directory", kind);
        }
    }

    /// Destination entries with no source counterpart are archived away.
    /// Runs after the source children so that a rename within a directory
    /// is seen as copy-then-delete, never delete-then-copy.
    fn delete_pass(&mut self, dst_dir: &Path, src_batch: &[Entry], dst_batch: &[Entry]) {
        for entry in dst_batch.iter().filter(|e| !e.is_dir) {
            if entry.name == archive::ARCHIVE_DIR_NAME {
                continue;
            }
            if find_entry(src_batch, &entry.name).is_some() {
                continue;
            }
            let dst_path = dst_dir.join(&entry.name);
            if self.dst_filter.matches(&dst_path) {
                continue;
            }
            if self.config.skip_timestamps && is_timestamp_like(&entry.name) {
                continue;
            }
            self.archive_for_deletion(&dst_path);
        }

        for entry in dst_batch.iter().filter(|e| e.is_dir) {
            if entry.name == archive::ARCHIVE_DIR_NAME {
                continue;
            }
            if find_entry(src_batch, &entry.name).is_some() {
                continue;
            }
            let dst_path = dst_dir.join(&entry.name);
            if self.dst_filter.matches(&dst_path) {
                continue;
            }
            self.archive_for_deletion(&dst_path);
        }
    }

    fn archive_for_deletion(&mut self, dst_path: &Path) {
        self.log.archiving(dst_path);
        if self.config.preview {
            self.stats.files_deleted += 1;
            return;
        }
        match archive::archive_entry(dst_path, &self.run_timestamp) {
            // NotFound here means a racing process finished the job.
            Ok(_) | Err(SyncErrorKind::NotFound) => self.stats.files_deleted += 1,
            Err(kind) => self.record(None, Some(dst_path), SyncAction::Delete.label(), kind),
        }
    }

    fn record(
        &mut self,
        source: Option<&Path>,
        dest: Option<&Path>,
        action: &'static str,
        kind: SyncErrorKind,
    ) {
        self.log.error(action, source.or(dest), &kind);
        self.errors.push(SyncError {
            source: source.map(Path::to_path_buf),
            dest: dest.map(Path::to_path_buf),
            action,
            kind,
        });
    }
}

fn verify_sizes(src: &Path, dst: &Path) -> Result<Option<(u64, u64)>, SyncErrorKind> {
    let expected = fs::metadata(src)?.len();
    let actual = fs::metadata(dst)?.len();
    Ok((expected != actual).then_some((expected, actual)))
}
