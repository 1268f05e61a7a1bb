//! InventoryStore — redb-backed runner inventory.
//!
//! Provides typed CRUD operations over `RunnerRecord`s. Values are
//! JSON-serialized into redb's `&[u8]` value column. The store supports
//! both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use runnerscale_core::{InventoryError, RunnerInventory, RunnerRecord, Scope};

use crate::error::{StateError, StateResult};
use crate::tables::RUNNERS;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe runner inventory backed by redb.
#[derive(Clone)]
pub struct InventoryStore {
    db: Arc<Database>,
}

impl InventoryStore {
    /// Open (or create) a persistent inventory at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "inventory store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory inventory (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory inventory store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RUNNERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert or update a runner record.
    pub fn put_runner(&self, record: &RunnerRecord) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RUNNERS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, category = %record.category, "runner stored");
        Ok(())
    }

    /// Get a runner by its composite key.
    pub fn get_runner(&self, key: &str) -> StateResult<Option<RunnerRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RUNNERS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: RunnerRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List the runners of one environment and scope, in key order.
    pub fn list_runners(&self, environment: &str, scope: &Scope) -> StateResult<Vec<RunnerRecord>> {
        let prefix = format!("{environment}:{}:", scope.storage_key());
        self.scan(|key| key.starts_with(&prefix))
    }

    /// List every runner of one environment, across scopes.
    pub fn list_environment(&self, environment: &str) -> StateResult<Vec<RunnerRecord>> {
        let prefix = format!("{environment}:");
        self.scan(|key| key.starts_with(&prefix))
    }

    /// List every tracked runner.
    pub fn list_all(&self) -> StateResult<Vec<RunnerRecord>> {
        self.scan(|_| true)
    }

    /// Delete a runner by key. Returns true if it existed.
    pub fn delete_runner(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(RUNNERS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "runner deleted");
        Ok(existed)
    }

    fn scan<F>(&self, matches: F) -> StateResult<Vec<RunnerRecord>>
    where
        F: Fn(&str) -> bool,
    {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RUNNERS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if matches(key.value()) {
                let record: RunnerRecord =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl RunnerInventory for InventoryStore {
    async fn list_tracked_runners(
        &self,
        environment: &str,
        scope: &Scope,
    ) -> Result<Vec<RunnerRecord>, InventoryError> {
        Ok(self.list_runners(environment, scope)?)
    }
}
