//! File operations: watchdog copy and archive-move

pub mod archive;
pub mod copy;

pub use archive::{
    archive_entry, archive_path_for, restore_archived, run_timestamp, ArchiveManifest,
    ARCHIVE_DIR_NAME,
};
pub use copy::copy_file;
