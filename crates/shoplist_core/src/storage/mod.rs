//! Key-value blob storage contract and adapters.
//!
//! # Responsibility
//! - Define the async `load`/`save` contract the list store persists through.
//! - Provide concrete adapters (process memory, SQLite).
//!
//! # Invariants
//! - Values are whole JSON documents; adapters never merge or patch.
//! - `load` returns `Ok(None)` for a missing key, never an error.
//! - A value that cannot be decoded is reported as `StorageError::Corrupt`.

use crate::db::DbError;
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failure taxonomy.
#[derive(Debug)]
pub enum StorageError {
    /// Database transport or bootstrap failure.
    Db(DbError),
    /// Value could not be encoded for writing.
    Serialization(serde_json::Error),
    /// Stored value exists but does not decode to the expected shape.
    Corrupt { key: String, message: String },
    /// Backend is not usable (poisoned lock, runtime shut down).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode stored value: {err}"),
            Self::Corrupt { key, message } => {
                write!(f, "stored value for `{key}` is corrupt: {message}")
            }
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Corrupt { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Async key -> JSON blob store.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Reads the value stored under `key`.
    async fn load(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Replaces the value stored under `key`.
    async fn save(&self, key: &str, value: &Value) -> StorageResult<()>;
}
