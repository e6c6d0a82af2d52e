//! Key-value persistence
//!
//! The widget persists exactly one value (the serialized history) under a
//! fixed key. `RedbStore` keeps it in an embedded database in the platform
//! data dir; `InMemoryStore` is the fallback when that database cannot be
//! opened, and doubles as the store used in tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use directories::ProjectDirs;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};

/// Key: storage key, Value: serialized payload
const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("kv_store");

/// Storage capability used for history persistence
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

/// Redb-based storage implementation
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the store in the platform data directory
    pub fn open_default() -> AppResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "thaiflow", "thai-flow")
            .ok_or_else(|| AppError::Storage("Failed to get project directories".to_string()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| AppError::Io(format!("Failed to create data directory: {}", e)))?;

        Self::open(&data_dir.join("thai_flow.redb"))
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        let db = Database::create(path)
            .map_err(|e| AppError::Storage(format!("Failed to create database: {}", e)))?;

        // Create the table up front so reads never hit a missing table
        let write_txn = db.begin_write().map_err(redb::Error::from)?;
        {
            let _table = write_txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        }
        write_txn.commit().map_err(redb::Error::from)?;

        debug!(path = %path.display(), "Opened key-value store");
        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let read_txn = self.db.begin_read().map_err(redb::Error::from)?;
        let table = read_txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        let value = table.get(key).map_err(redb::Error::from)?;
        Ok(value.map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let write_txn = self.db.begin_write().map_err(redb::Error::from)?;
        {
            let mut table = write_txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
            table.insert(key, value).map_err(redb::Error::from)?;
        }
        write_txn.commit().map_err(redb::Error::from)?;
        Ok(())
    }
}

/// In-memory fallback storage (used if database initialization fails)
#[derive(Default)]
pub struct InMemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("In-memory store mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the on-disk store, falling back to memory so the widget still works
/// (without durability) when the data dir is unusable.
pub fn open_default_store() -> Box<dyn KeyValueStore> {
    match RedbStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "Failed to initialize database, using in-memory fallback");
            Box::new(InMemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redb_store_overwrites_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            assert_eq!(store.get("translationHistory").unwrap(), None);
            store.set("translationHistory", "[1]").unwrap();
            store.set("translationHistory", "[2]").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("translationHistory").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn in_memory_store_round_trip() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
