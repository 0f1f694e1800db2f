use clap::Parser;
use kitchensync::config::Cli;
use kitchensync::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this resolves and validates the roots
    let config = Config::try_from(cli)?;

    println!("kitchensync v{}", kitchensync::VERSION);
    let report = kitchensync::commands::sync::run(config)?;

    // Any recorded per-entry failure makes the whole run non-zero
    if !report.errors.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
