//! goatpad CLI entry point.
//!
//! Usage:
//!   goatpad merge --template T --db D --output O   # Batch mail-merge
//!   goatpad table --db D list                      # Contact tables

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use goatpad_cli::{Cli, Commands, commands};

fn main() -> ExitCode {
    // RUST_LOG wins; otherwise goatpad's own info-level events.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("goatpad=info")))
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge(args) => {
            let runtime = Runtime::new().context("Failed to create tokio runtime")?;
            runtime.block_on(commands::merge::execute(args))
        }
        Commands::Table(args) => {
            commands::table::execute(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
