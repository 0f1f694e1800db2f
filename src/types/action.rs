//! SyncAction - Actions selected per source entry

/// Action selected for one source/destination entry pair.
///
/// Actions are computed per comparison and executed immediately; they are
/// never stored in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Copy new file (exists in source, missing in destination)
    Copy,

    /// Overwrite existing file (archive the destination, then copy)
    Update,

    /// Archive a destination-only entry
    Delete,

    /// Create a destination directory
    CreateDir,

    /// Nothing to do (entries compare equal)
    Skip,
}

impl SyncAction {
    /// Short operation label used in error records and log lines.
    pub fn label(self) -> &'static str {
        match self {
            SyncAction::Copy => "copying",
            SyncAction::Update => "updating",
            SyncAction::Delete => "archiving for deletion",
            SyncAction::CreateDir => "creating directory",
            SyncAction::Skip => "skipping",
        }
    }
}
