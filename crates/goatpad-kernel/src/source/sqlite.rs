//! SQLite row source.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use goatpad_types::Record;

use super::RowSource;
use crate::store::{ContactStore, StoreError, StoreResult};

/// Row source backed by a [`ContactStore`].
///
/// Queries run on tokio's blocking pool so a large table scan does not stall
/// the runtime.
#[derive(Clone)]
pub struct SqliteSource {
    store: Arc<Mutex<ContactStore>>,
}

impl SqliteSource {
    pub fn new(store: ContactStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ContactStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let guard = store
                .lock()
                .map_err(|_| StoreError::Worker("store lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl RowSource for SqliteSource {
    async fn columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let table = table.to_string();
        self.with_store(move |store| store.column_names(&table)).await
    }

    async fn fetch_all(&self, table: &str) -> StoreResult<Vec<Record>> {
        let table = table.to_string();
        self.with_store(move |store| store.rows(&table)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goatpad_types::Column;

    #[tokio::test]
    async fn test_sqlite_source_reads_rows() {
        let store = ContactStore::in_memory().expect("store");
        store
            .create_table("contacts", &[Column::varchar("Name"), Column::varchar("ID")])
            .expect("create");
        store
            .insert_row("contacts", &["Ada".to_string(), "7".to_string()])
            .expect("insert");

        let source = SqliteSource::new(store);
        assert_eq!(source.columns("contacts").await.expect("columns"), vec!["Name", "ID"]);

        let rows = source.fetch_all("contacts").await.expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("ID"), Some("7"));
    }

    #[tokio::test]
    async fn test_sqlite_source_unknown_table() {
        let source = SqliteSource::new(ContactStore::in_memory().expect("store"));
        let err = source.fetch_all("contacts").await.expect_err("should fail");
        assert!(matches!(err, StoreError::UnknownTable(_)));
    }
}
