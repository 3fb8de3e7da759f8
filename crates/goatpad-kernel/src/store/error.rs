//! Storage errors.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Contact store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("table not found: {0}")]
    UnknownTable(String),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("too many columns: {count} (max {max})")]
    TooManyColumns { count: usize, max: usize },
    #[error("table '{0}' needs at least one column")]
    NoColumns(String),
    #[error("table '{table}' has {expected} columns, got {actual} values")]
    ArityMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid date {value:?} for column '{column}' (expected YYYY-MM-DD)")]
    InvalidDate { column: String, value: String },
    #[error("store worker failed: {0}")]
    Worker(String),
}
