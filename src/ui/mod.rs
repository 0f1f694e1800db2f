//! Timestamped event log
//!
//! One stdout line per event, gated by verbosity:
//! 0 silent, 1 per-operation + errors, 2 also per-directory loads. Paths
//! are shown relative to whichever tree root contains them; the strings are
//! display-only and never fed back into I/O.

use crate::types::SyncErrorKind;
use chrono::Local;
use std::path::{Path, PathBuf};

pub struct EventLog {
    verbosity: u8,
    src_root: PathBuf,
    dst_root: PathBuf,
}

impl EventLog {
    pub fn new(verbosity: u8, src_root: &Path, dst_root: &Path) -> Self {
        Self {
            verbosity,
            src_root: src_root.to_path_buf(),
            dst_root: dst_root.to_path_buf(),
        }
    }

    pub fn copying(&self, path: &Path) {
        if self.verbosity >= 1 {
            self.line(&format!("copying {}", self.display_path(path)));
        }
    }

    pub fn archiving(&self, path: &Path) {
        if self.verbosity >= 1 {
            self.line(&format!(
                "moving to .kitchensync: {}",
                self.display_path(path)
            ));
        }
    }

    pub fn loading(&self, dir: &Path) {
        if self.verbosity >= 2 {
            self.line(&format!("loading directory: {}", self.display_path(dir)));
        }
    }

    pub fn refreshing_mtime(&self, path: &Path) {
        if self.verbosity >= 2 {
            self.line(&format!(
                "updating modification time: {}",
                self.display_path(path)
            ));
        }
    }

    pub fn rolling_back(&self, what: &str) {
        if self.verbosity >= 1 {
            self.line(&format!("rolling back: {what}"));
        }
    }

    pub fn error(&self, action: &str, path: Option<&Path>, kind: &SyncErrorKind) {
        if self.verbosity >= 1 {
            let shown = path
                .map(|p| self.display_path(p))
                .unwrap_or_else(|| "?".to_string());
            self.line(&format!("error: {action} '{shown}': {kind}"));
        }
    }

    fn line(&self, message: &str) {
        let stamp = Local::now().format("%Y-%m-%d_%H:%M:%S");
        println!("[{stamp}] {message}");
    }

    /// Relativize against whichever root contains the path; fall back to
    /// the path as given.
    fn display_path(&self, path: &Path) -> String {
        let relative = path
            .strip_prefix(&self.src_root)
            .or_else(|_| path.strip_prefix(&self.dst_root));
        match relative {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}
