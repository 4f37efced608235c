//! Tapioca CLI
//!
//! Command-line interface for reading Mandyoc output.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tapioca_cli::cli::Cli;
use tapioca_cli::config::Config;
use tapioca_cli::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config is reported by the command itself.
    let configured = Config::load(cli.config.as_deref())
        .ok()
        .map(|config| config.logging.level);
    logging::init(&logging::filter_directive(
        cli.verbose,
        cli.quiet,
        configured.as_deref(),
    ));

    tapioca_cli::run(cli)?;
    Ok(())
}
