//! Sentinel CLI entry point

use anyhow::Context;
use clap::Parser;
use tracing::error;

use sentinel_cli::{Cli, CommandDispatcher};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only sink output
    setup_logging(cli.verbose);

    if let Err(e) = CommandDispatcher::execute(cli) {
        error!("Command execution failed: {}", e);
        return Err(e).context("sentinel command failed");
    }
    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(verbose)
        .with_file(false)
        .with_line_number(false)
        .init();
}
