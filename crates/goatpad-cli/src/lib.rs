//! goatpad-cli: argument parsing and command handlers for the `goatpad` binary.
//!
//! - `goatpad merge`: render a template once per contact row into an output directory
//! - `goatpad table`: create, fill and inspect contact tables
//!
//! Batch inputs can also come from `GOATPAD_TEMPLATE`, `GOATPAD_DB` and
//! `GOATPAD_OUTPUT`. Merge defaults come from `goatpad.toml` in the user
//! config directory.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};

/// goatpad - mail-merge contact tables into text files.
#[derive(Debug, Parser)]
#[command(name = "goatpad")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the template for every row of a table.
    Merge(commands::merge::MergeArgs),
    /// Manage contact tables.
    Table(commands::table::TableArgs),
}

/// How results are printed to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
