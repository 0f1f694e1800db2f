//! Counters accumulated over one sync run

/// Aggregate counters for a sync run.
///
/// Preview runs report the same counters a real run would, without having
/// performed any filesystem mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Files copied that did not exist in the destination
    pub files_copied: usize,

    /// Files overwritten after archiving the previous destination content
    pub files_updated: usize,

    /// Destination-only entries archived away (one per archive-move)
    pub files_deleted: usize,

    /// Destination directories created
    pub dirs_created: usize,

    /// Files that compared equal and required no transfer
    pub files_unchanged: usize,

    /// Number of recorded per-entry failures
    pub errors: usize,

    /// Payload bytes written by copy and update actions
    pub bytes_copied: u64,
}
