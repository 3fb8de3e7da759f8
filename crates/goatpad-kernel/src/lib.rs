//! goatpad-kernel: the storage and mail-merge core of goatpad.
//!
//! This crate provides:
//!
//! - **Store**: SQLite-backed contacts tables with user-defined columns
//! - **Source**: The `RowSource` trait the merge reads rows through
//! - **Template**: Single-pass `{{column}}` placeholder substitution
//! - **Namer**: Deterministic output file names and collision handling
//! - **Scheduler**: Bounded fan-out with a join barrier
//! - **Merge**: The orchestrator tying it all together
//! - **Config**: TOML settings for merge defaults

pub mod config;
pub mod merge;
pub mod namer;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod template;

pub use config::MergeSettings;
pub use merge::{MergeConfig, MergeError, Merger};
pub use namer::{Claim, NameClaims, OutputNamer};
pub use scheduler::{DEFAULT_CONCURRENCY, FanOut, FanOutStats, TaskPanicked};
pub use source::{MemorySource, RowSource, SqliteSource};
pub use store::{ContactStore, MAX_COLUMNS, StoreError, StoreResult};
pub use template::Template;

// Re-export the data types so embedders need only one dependency.
pub use goatpad_types::{
    CollisionPolicy, Column, ColumnType, MergeEvent, MergeSummary, Record, TaskFailure,
    TaskOutcome,
};
