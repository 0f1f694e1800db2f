//! Configuration management

use crate::types::SyncErrorKind;
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};

/// Safe one-way directory mirroring.
///
/// Mirrors SOURCE into DESTINATION. Every file that would be overwritten or
/// deleted is first moved into a per-run `.kitchensync/<timestamp>/`
/// directory alongside it, so no content is ever lost.
#[derive(Debug, Parser)]
#[command(name = "kitchensync", version, about, long_about = None)]
pub struct Cli {
    /// Source directory
    pub source: PathBuf,

    /// Destination directory (created if it does not exist)
    pub destination: PathBuf,

    /// Preview mode - show what would be done without doing it
    #[arg(short = 'p', value_name = "Y/N", default_value = "Y",
          value_parser = parse_yes_no, action = clap::ArgAction::Set)]
    pub preview: bool,

    /// Include timestamp-like filenames (e.g. backup_20240115_1430.zip)
    #[arg(short = 't', value_name = "Y/N", default_value = "N",
          value_parser = parse_yes_no, action = clap::ArgAction::Set)]
    pub include_timestamps: bool,

    /// Use modification times for comparison
    #[arg(short = 'm', value_name = "Y/N", default_value = "Y",
          value_parser = parse_yes_no, action = clap::ArgAction::Set)]
    pub use_modtime: bool,

    /// Verbosity: 0=silent, 1=normal, 2=verbose
    #[arg(short = 'v', value_name = "0/1/2", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: u8,

    /// Abort a file copy after SECONDS without progress (0 disables)
    #[arg(short = 'a', value_name = "SECONDS", default_value_t = 30)]
    pub abort_timeout: u64,

    /// Exclude paths matching a glob pattern, relative to either root
    /// (repeatable)
    #[arg(short = 'x', value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.to_ascii_uppercase().as_str() {
        "Y" | "YES" | "TRUE" => Ok(true),
        "N" | "NO" | "FALSE" => Ok(false),
        other => Err(format!("expected Y or N, got '{other}'")),
    }
}

/// Resolved, validated configuration handed to the engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute source root
    pub source: PathBuf,

    /// Absolute destination root
    pub destination: PathBuf,

    /// Log and count everything, mutate nothing
    pub preview: bool,

    /// Filter out timestamp-like file names
    pub skip_timestamps: bool,

    /// Let modification times participate in change detection
    pub use_modtime: bool,

    /// 0 = silent, 1 = per-operation + summary, 2 = also directory loads
    pub verbosity: u8,

    /// Copy watchdog deadline in seconds; 0 disables it
    pub abort_timeout: u64,

    /// Glob patterns excluded from both trees
    pub exclude_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            preview: true,
            skip_timestamps: true,
            use_modtime: true,
            verbosity: 1,
            abort_timeout: 30,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), SyncErrorKind> {
        if !self.source.is_dir() {
            return Err(SyncErrorKind::RootInaccessible(format!(
                "source is not a directory: {}",
                self.source.display()
            )));
        }
        if self.source == self.destination {
            return Err(SyncErrorKind::RootInaccessible(
                "source and destination are the same directory".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = SyncErrorKind;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let source = cli.source.canonicalize().map_err(|e| {
            SyncErrorKind::RootInaccessible(format!(
                "source {}: {}",
                cli.source.display(),
                SyncErrorKind::classify(e)
            ))
        })?;
        let destination = absolutize(&cli.destination)?;

        let config = Self {
            source,
            destination,
            preview: cli.preview,
            skip_timestamps: !cli.include_timestamps,
            use_modtime: cli.use_modtime,
            verbosity: cli.verbosity,
            abort_timeout: cli.abort_timeout,
            exclude_patterns: cli.exclude,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Absolute form of a path that may not exist yet: canonical when possible,
/// otherwise pure resolution against the current directory.
fn absolutize(path: &Path) -> Result<PathBuf, SyncErrorKind> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
