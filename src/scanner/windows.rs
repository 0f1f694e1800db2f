//! Batched directory enumeration via FindFirstFileW
//!
//! Each `WIN32_FIND_DATAW` record already carries name, attributes, size,
//! and last-write time, so no per-child open or stat is issued.

use crate::types::{Entry, SyncErrorKind};
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES,
    ERROR_PATH_NOT_FOUND, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, FindNextFileW, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_REPARSE_POINT, WIN32_FIND_DATAW,
};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_EPOCH_DELTA_SECS: i64 = 11_644_473_600;

/// FILETIME ticks are 100 ns.
const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Owned find handle, closed on every exit path.
struct FindHandle(HANDLE);

impl Drop for FindHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful FindFirstFileW and is
        // closed exactly once.
        unsafe {
            FindClose(self.0);
        }
    }
}

pub(super) fn list_directory(dir: &Path) -> Result<Vec<Entry>, SyncErrorKind> {
    let pattern = search_pattern(dir);
    let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };

    // SAFETY: pattern is a nul-terminated UTF-16 string and data is a valid
    // out-pointer for the duration of the call.
    let raw = unsafe { FindFirstFileW(pattern.as_ptr(), &mut data) };
    if raw == INVALID_HANDLE_VALUE {
        return Err(last_error_kind());
    }
    let handle = FindHandle(raw);

    let mut batch = Vec::new();
    loop {
        if let Some(entry) = entry_from_record(&data) {
            batch.push(entry);
        }

        // SAFETY: handle is live and data remains a valid out-pointer.
        let more = unsafe { FindNextFileW(handle.0, &mut data) };
        if more == 0 {
            let code = unsafe { GetLastError() };
            if code == ERROR_NO_MORE_FILES {
                break;
            }
            return Err(SyncErrorKind::classify(io::Error::from_raw_os_error(
                code as i32,
            )));
        }
    }

    Ok(batch)
}

/// `dir` + `\*`, nul-terminated UTF-16.
fn search_pattern(dir: &Path) -> Vec<u16> {
    let mut pattern: Vec<u16> = dir.as_os_str().encode_wide().collect();
    if pattern.last() != Some(&u16::from(b'\\')) {
        pattern.push(u16::from(b'\\'));
    }
    pattern.push(u16::from(b'*'));
    pattern.push(0);
    pattern
}

fn entry_from_record(data: &WIN32_FIND_DATAW) -> Option<Entry> {
    // Reparse points cover junctions and symlinks; both are skipped.
    if data.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
        return None;
    }

    let name = decode_name(&data.cFileName)?;
    if name == "." || name == ".." {
        return None;
    }

    let is_dir = data.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0;
    let size = if is_dir {
        0
    } else {
        (u64::from(data.nFileSizeHigh) << 32) | u64::from(data.nFileSizeLow)
    };

    let ticks = (u64::from(data.ftLastWriteTime.dwHighDateTime) << 32)
        | u64::from(data.ftLastWriteTime.dwLowDateTime);
    let mtime = (ticks / FILETIME_TICKS_PER_SEC) as i64 - FILETIME_UNIX_EPOCH_DELTA_SECS;

    Some(Entry {
        name,
        size,
        mtime,
        is_dir,
    })
}

fn decode_name(wide: &[u16; 260]) -> Option<String> {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    if len == 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&wide[..len]))
}

fn last_error_kind() -> SyncErrorKind {
    let code = unsafe { GetLastError() };
    match code {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => SyncErrorKind::NotFound,
        ERROR_ACCESS_DENIED => SyncErrorKind::AccessDenied,
        _ => SyncErrorKind::classify(io::Error::from_raw_os_error(code as i32)),
    }
}
