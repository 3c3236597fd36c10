//! Core domain logic for the shopping list.
//! This crate is the single source of truth for list ordering and persistence.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod service;
pub mod storage;
pub mod write_queue;

pub use clock::{Clock, IdGenerator, ManualClock, SystemClock, UuidGenerator};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, ItemValidationError};
pub use ordering::{compare_items, order_items, sort_items};
pub use service::list_ops::{apply_command, decode_items, encode_items, ListCommand, Transition};
pub use service::list_store::{ListCounts, ListStore, StoreConfig, DEFAULT_STORAGE_KEY};
pub use storage::{MemoryStorage, SqliteStorage, StorageAdapter, StorageError, StorageResult};
pub use write_queue::{PersistStatus, WriteQueue};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
