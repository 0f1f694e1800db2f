//! Change detection for one source file against its destination peer

use crate::types::{Entry, SyncAction};

/// Decide what to do with source file `src` given the destination entry of
/// the same name, if any.
///
/// The decision order is:
/// 1. missing destination: copy
/// 2. destination is a directory where a file belongs: update (the
///    directory gets archived out of the way first)
/// 3. size difference: update
/// 4. newer source mtime, when mtime participates: update
/// 5. otherwise: skip
///
/// `use_modtime = false` only disables the mtime tiebreaker; equal sizes
/// then always compare unchanged. mtimes are whole seconds, so sub-second
/// churn never triggers an update.
pub fn decide(src: &Entry, dest: Option<&Entry>, use_modtime: bool) -> SyncAction {
    let Some(dest) = dest else {
        return SyncAction::Copy;
    };

    if dest.is_dir {
        return SyncAction::Update;
    }

    if src.size != dest.size {
        return SyncAction::Update;
    }

    if use_modtime && src.mtime > dest.mtime {
        return SyncAction::Update;
    }

    SyncAction::Skip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> Entry {
        Entry::file("test.txt", 100, 1_000)
    }

    #[test]
    fn test_missing_dest_copies() {
        assert_eq!(decide(&src(), None, false), SyncAction::Copy);
        assert_eq!(decide(&src(), None, true), SyncAction::Copy);
    }

    #[test]
    fn test_equal_entries_skip() {
        let dest = Entry::file("test.txt", 100, 1_000);
        assert_eq!(decide(&src(), Some(&dest), false), SyncAction::Skip);
        assert_eq!(decide(&src(), Some(&dest), true), SyncAction::Skip);
    }

    #[test]
    fn test_size_difference_updates_either_way() {
        let bigger = Entry::file("test.txt", 200, 1_000);
        let smaller = Entry::file("test.txt", 50, 1_000);
        for dest in [&bigger, &smaller] {
            assert_eq!(decide(&src(), Some(dest), false), SyncAction::Update);
            assert_eq!(decide(&src(), Some(dest), true), SyncAction::Update);
        }
    }

    #[test]
    fn test_newer_source_mtime_updates_only_with_modtime() {
        let older_dest = Entry::file("test.txt", 100, 500);
        assert_eq!(decide(&src(), Some(&older_dest), true), SyncAction::Update);
        assert_eq!(decide(&src(), Some(&older_dest), false), SyncAction::Skip);
    }

    #[test]
    fn test_newer_dest_mtime_skips() {
        let newer_dest = Entry::file("test.txt", 100, 2_000);
        assert_eq!(decide(&src(), Some(&newer_dest), true), SyncAction::Skip);
        assert_eq!(decide(&src(), Some(&newer_dest), false), SyncAction::Skip);
    }

    #[test]
    fn test_directory_in_place_of_file_updates() {
        let dest = Entry::dir("test.txt", 1_000);
        assert_eq!(decide(&src(), Some(&dest), false), SyncAction::Update);
    }

    #[test]
    fn test_zero_byte_file_against_directory_still_updates() {
        let empty = Entry::file("test.txt", 0, 1_000);
        let dest = Entry::dir("test.txt", 1_000);
        assert_eq!(decide(&empty, Some(&dest), false), SyncAction::Update);
    }
}
