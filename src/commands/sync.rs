//! The sync command: configuration display, engine run, summary

use crate::config::Config;
use crate::engine::{self, SyncReport};
use crate::types::SyncErrorKind;
use indicatif::HumanBytes;

/// Run a sync and print the surrounding ceremony: the configuration block,
/// the preview banner, and the end-of-run summary with any errors.
pub fn run(config: Config) -> Result<SyncReport, SyncErrorKind> {
    println!("{}", format_configuration(&config));

    if config.preview {
        println!();
        println!("PREVIEW MODE: No changes will be made. Use -p=N to perform the sync.");
    }

    let report = engine::sync(&config)?;

    println!("{}", format_summary(&report, &config));
    Ok(report)
}

fn format_configuration(config: &Config) -> String {
    let excludes = if config.exclude_patterns.is_empty() {
        "(none)".to_string()
    } else {
        config.exclude_patterns.join(", ")
    };
    let timeout = if config.abort_timeout == 0 {
        "disabled".to_string()
    } else {
        format!("{} seconds", config.abort_timeout)
    };

    let mut lines = vec!["kitchensync configuration:".to_string()];
    lines.push(format!("  Source:           {}", config.source.display()));
    lines.push(format!(
        "  Destination:      {}",
        config.destination.display()
    ));
    lines.push(format!("  Preview:          {}", enabled(config.preview)));
    lines.push(format!(
        "  Skip timestamps:  {}",
        enabled(config.skip_timestamps)
    ));
    lines.push(format!(
        "  Use modtime:      {}",
        enabled(config.use_modtime)
    ));
    lines.push(format!("  Abort timeout:    {timeout}"));
    lines.push(format!("  Excludes:         {excludes}"));
    lines.push(format!("  Verbosity:        {}", config.verbosity));
    lines.join("\n")
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

fn format_summary(report: &SyncReport, config: &Config) -> String {
    let stats = &report.stats;
    let mut lines = vec![String::new(), "Synchronization summary:".to_string()];
    lines.push(format!("  Files copied:        {}", stats.files_copied));
    lines.push(format!("  Files updated:       {}", stats.files_updated));
    lines.push(format!("  Files deleted:       {}", stats.files_deleted));
    lines.push(format!("  Directories created: {}", stats.dirs_created));
    lines.push(format!("  Files unchanged:     {}", stats.files_unchanged));
    lines.push(format!(
        "  Bytes copied:        {}",
        HumanBytes(stats.bytes_copied)
    ));
    lines.push(format!("  Errors:              {}", stats.errors));

    if !report.errors.is_empty() && config.verbosity >= 1 {
        lines.push(String::new());
        lines.push(format!(
            "Synchronization completed with {} error(s):",
            report.errors.len()
        ));
        for (idx, error) in report.errors.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!("Error {}:", idx + 1));
            lines.push(format!(
                "  Source:      {}",
                error
                    .source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ));
            lines.push(format!(
                "  Destination: {}",
                error
                    .dest
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ));
            lines.push(format!("  Operation:   {}", error.action));
            lines.push(format!("  Error:       {}", error.kind));
        }
    }

    if config.preview {
        lines.push(String::new());
        lines.push(
            "PREVIEW MODE: No changes were made. Use -p=N to perform the sync shown above."
                .to_string(),
        );
    }

    lines.join("\n")
}
