//! In-memory row source.
//!
//! Used for testing and by embedders that already hold their rows.

use std::collections::HashMap;

use async_trait::async_trait;

use goatpad_types::Record;

use super::RowSource;
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

/// Row source over tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Table>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table.
    ///
    /// Each row is projected onto `columns`: missing columns read as empty,
    /// extra columns are dropped.
    pub fn with_table<C: Into<String>>(
        mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = C>,
        rows: impl IntoIterator<Item = Record>,
    ) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let rows: Vec<Record> = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).unwrap_or_default().to_string()))
                    .collect::<Record>()
            })
            .collect();
        self.tables.insert(name.into(), Table { columns, rows });
        self
    }

    fn table(&self, name: &str) -> StoreResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }
}

#[async_trait]
impl RowSource for MemorySource {
    async fn columns(&self, table: &str) -> StoreResult<Vec<String>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn fetch_all(&self, table: &str) -> StoreResult<Vec<Record>> {
        Ok(self.table(table)?.rows.clone())
    }
}
