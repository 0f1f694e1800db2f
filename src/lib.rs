//! # kitchensync - Safe One-Way Directory Mirroring
//!
//! Nothing is ever lost: every file the sync would overwrite or delete is
//! first moved into a per-run, timestamped `.kitchensync/` archive next to
//! it.
//!
//! Built to survive the pathologies of Windows I/O - antivirus scanning,
//! intermittent locks, per-file kernel-transition costs - with a batched
//! directory lister and a watchdog that abandons stalled copies instead of
//! stalling the run.

pub mod commands;
pub mod config;
pub mod engine;
pub mod executor;
pub mod filter;
pub mod scanner;
pub mod types;
pub mod ui;

pub use config::{Cli, Config};
pub use engine::{sync, SyncReport};
pub use executor::ARCHIVE_DIR_NAME;
pub use types::{Entry, SyncAction, SyncError, SyncErrorKind, SyncStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
