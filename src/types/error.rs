//! Error types for kitchensync

use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Failure categories the engine distinguishes.
///
/// Per-entry failures are recorded as [`SyncError`]s and the traversal
/// continues; only `BadPattern` and `RootInaccessible` abort a run.
#[derive(Debug, Error)]
pub enum SyncErrorKind {
    /// The target vanished between listing and action. Expected under
    /// concurrent modification; absorbed silently in the archive/delete path.
    #[error("NotFound")]
    NotFound,

    #[error("AccessDenied")]
    AccessDenied,

    #[error("DiskFull")]
    DiskFull,

    #[error("QuotaExceeded")]
    QuotaExceeded,

    /// The copy watchdog observed no progress for the configured interval.
    #[error("Timeout ({0}s without progress)")]
    Timeout(u64),

    /// Post-copy verification found a destination size differing from the
    /// source; the failed copy has been rolled back.
    #[error("SizeMismatch (expected {expected} bytes, got {actual} bytes)")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("bad pattern: {0}")]
    BadPattern(String),

    #[error("root inaccessible: {0}")]
    RootInaccessible(String),

    #[error("IO error: {0}")]
    Io(Error),
}

impl SyncErrorKind {
    /// Classify an I/O error into the category the summary reports.
    ///
    /// ENOSPC (28) and `StorageFull` become `DiskFull`; EDQUOT (122)
    /// becomes `QuotaExceeded`; anything unrecognized stays `Io`.
    pub fn classify(error: Error) -> Self {
        match error.kind() {
            ErrorKind::NotFound => SyncErrorKind::NotFound,
            ErrorKind::PermissionDenied => SyncErrorKind::AccessDenied,
            ErrorKind::StorageFull => SyncErrorKind::DiskFull,
            _ => match error.raw_os_error() {
                Some(28) => SyncErrorKind::DiskFull,
                Some(122) => SyncErrorKind::QuotaExceeded,
                _ => SyncErrorKind::Io(error),
            },
        }
    }

}

impl From<Error> for SyncErrorKind {
    fn from(error: Error) -> Self {
        SyncErrorKind::classify(error)
    }
}

/// One recorded per-entry failure, surfaced in the end-of-run summary.
#[derive(Debug)]
pub struct SyncError {
    /// Source path involved, when the operation had one
    pub source: Option<PathBuf>,

    /// Destination path involved, when the operation had one
    pub dest: Option<PathBuf>,

    /// What the engine was doing, e.g. "copying", "archiving"
    pub action: &'static str,

    pub kind: SyncErrorKind,
}
