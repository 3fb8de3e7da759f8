//! Subcommand handlers.

pub mod merge;
pub mod table;
