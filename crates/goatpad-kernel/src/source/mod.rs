//! Row sources: where a merge gets its records from.
//!
//! A row source answers two questions about a named table: which columns it
//! has (in order), and what all of its rows are. The merge calls both exactly
//! once, before any work is dispatched, so sources never see concurrent use
//! from merge workers.

mod memory;
mod sqlite;

pub use memory::MemorySource;
pub use sqlite::SqliteSource;

use async_trait::async_trait;

use goatpad_types::Record;

use crate::store::StoreResult;

/// Tabular data backend for the merge.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Ordered column names of `table`.
    ///
    /// Returns `StoreError::UnknownTable` if the table does not exist.
    async fn columns(&self, table: &str) -> StoreResult<Vec<String>>;

    /// Every row of `table`, values as text in column order.
    ///
    /// All-or-nothing: either the full row set or an error.
    async fn fetch_all(&self, table: &str) -> StoreResult<Vec<Record>>;
}
