//! Process-local storage adapter.

use super::{StorageAdapter, StorageError, StorageResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-memory blob store.
///
/// Used for ephemeral sessions and tests. Counts loads and successful saves so
/// callers can observe read-once and write-through behavior.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one entry.
    pub fn with_entry(key: impl Into<String>, value: Value) -> Self {
        let storage = Self::default();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.into(), value);
        }
        storage
    }

    /// Returns a copy of the value currently stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().ok()?.get(key).cloned()
    }

    /// Number of `load` calls since creation.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful `save` calls since creation.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<String, Value>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
