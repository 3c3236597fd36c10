//! SQLite-backed storage adapter.
//!
//! # Responsibility
//! - Persist one JSON document per key in the `kv_store` table.
//! - Keep blocking SQLite calls off async worker threads.
//!
//! # Invariants
//! - `save` is an upsert of the full document for its key.
//! - A row whose text does not parse as JSON is reported as corrupt.

use super::{StorageAdapter, StorageError, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Durable blob store on top of a migrated SQLite connection.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let started_at = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                StorageError::Unavailable("sqlite connection lock poisoned".to_string())
            })?;
            f(&guard)
        })
        .await
        .map_err(|err| StorageError::Unavailable(format!("sqlite task failed: {err}")))?;

        debug!(
            "event=storage_{op} module=storage backend=sqlite status={} duration_ms={}",
            if result.is_ok() { "ok" } else { "error" },
            started_at.elapsed().as_millis()
        );
        result
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        let key = key.to_string();
        self.run("load", move |conn| {
            let raw = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1;",
                    [key.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;

            match raw {
                None => Ok(None),
                Some(text) => serde_json::from_str(&text).map(Some).map_err(|err| {
                    StorageError::Corrupt {
                        key,
                        message: err.to_string(),
                    }
                }),
            }
        })
        .await
    }

    async fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        let key = key.to_string();
        let text = serde_json::to_string(value).map_err(StorageError::Serialization)?;
        self.run("save", move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, text],
            )?;
            Ok(())
        })
        .await
    }
}
