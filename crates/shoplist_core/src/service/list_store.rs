//! Shopping list store.
//!
//! # Responsibility
//! - Own the canonical, ordered snapshot of list items for one session.
//! - Apply add/toggle/delete commands and publish the new snapshot.
//! - Hand every successful mutation to the write queue as a full document.
//!
//! # Invariants
//! - Mutations take `&mut self`: one writer per store.
//! - The snapshot is replaced, never edited in place.
//! - No-op commands neither replace the snapshot nor enqueue a write.
//! - Persistence failures never roll back the in-memory snapshot.
//! - Storage is read exactly once, when the store opens.

use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::model::item::{Item, ItemId};
use crate::service::list_ops::{apply_command, decode_items, encode_items, ListCommand};
use crate::storage::{StorageAdapter, StorageError, StorageResult};
use crate::write_queue::{PersistStatus, WriteQueue};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Storage key naming the whole list blob.
pub const DEFAULT_STORAGE_KEY: &str = "shopping-list";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the list blob is loaded from and saved under.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Item totals for the current snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCounts {
    pub total: usize,
    pub completed: usize,
    pub open: usize,
}

/// Single source of truth for the current item collection.
pub struct ListStore {
    items: Arc<[Item]>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    writer: WriteQueue,
}

impl ListStore {
    /// Opens a store with the system clock and UUID ids.
    ///
    /// See [`ListStore::open_with`].
    pub async fn open(
        storage: Arc<dyn StorageAdapter>,
        config: StoreConfig,
    ) -> StorageResult<Self> {
        Self::open_with(
            storage,
            config,
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        )
        .await
    }

    /// Opens a store, hydrating it from `storage` once.
    ///
    /// A missing, unreadable or corrupt blob starts the session with an
    /// empty list; the failure is logged, not returned.
    ///
    /// # Errors
    /// - `StorageError::Unavailable` when called outside a tokio runtime.
    pub async fn open_with(
        storage: Arc<dyn StorageAdapter>,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> StorageResult<Self> {
        let writer = WriteQueue::spawn(Arc::clone(&storage)).ok_or_else(|| {
            StorageError::Unavailable("list store requires a tokio runtime".to_string())
        })?;

        let started_at = Instant::now();
        let items = match load_items(storage.as_ref(), &config.storage_key).await {
            Ok(items) => {
                info!(
                    "event=hydrate module=list_store status=ok item_count={} duration_ms={}",
                    items.len(),
                    started_at.elapsed().as_millis()
                );
                items
            }
            Err(err) => {
                warn!(
                    "event=hydrate module=list_store status=degraded duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Vec::new()
            }
        };

        Ok(Self {
            items: items.into(),
            config,
            clock,
            ids,
            writer,
        })
    }

    /// Adds an item named `name` (trimmed).
    ///
    /// Returns the new item id, or `None` when `name` is blank.
    pub fn add(&mut self, name: &str) -> Option<ItemId> {
        self.apply(ListCommand::Add {
            name: name.to_string(),
        })
    }

    /// Flips completion of item `id`. Returns `false` for unknown ids.
    pub fn toggle_complete(&mut self, id: &str) -> bool {
        self.apply(ListCommand::ToggleComplete {
            id: ItemId::from(id),
        })
        .is_some()
    }

    /// Removes item `id`. Returns `false` for unknown ids.
    pub fn delete(&mut self, id: &str) -> bool {
        self.apply(ListCommand::Delete {
            id: ItemId::from(id),
        })
        .is_some()
    }

    /// Applies one command, then persists the whole list when it changed.
    ///
    /// Returns the affected item id, or `None` for a no-op.
    pub fn apply(&mut self, command: ListCommand) -> Option<ItemId> {
        let op = command.label();
        let now_ms = self.clock.now_ms();
        let Some(transition) = apply_command(&self.items, &command, now_ms, self.ids.as_ref())
        else {
            info!("event=list_mutation module=list_store op={op} status=noop");
            return None;
        };

        self.items = transition.items.into();
        info!(
            "event=list_mutation module=list_store op={op} status=ok item_count={}",
            self.items.len()
        );
        self.persist();
        Some(transition.item_id)
    }

    /// Ordered snapshot of the current list.
    ///
    /// Cheap to call; repeated calls without mutation return the same snapshot.
    pub fn current_ordered_view(&self) -> Arc<[Item]> {
        Arc::clone(&self.items)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn counts(&self) -> ListCounts {
        let completed = self.items.iter().filter(|item| item.is_completed()).count();
        ListCounts {
            total: self.items.len(),
            completed,
            open: self.items.len() - completed,
        }
    }

    pub fn storage_key(&self) -> &str {
        self.config.storage_key.as_str()
    }

    /// Current persistence progress, including the latest save failure.
    pub fn persist_status(&self) -> PersistStatus {
        self.writer.status()
    }

    /// Receiver notified on every persistence status change.
    pub fn subscribe_persist(&self) -> watch::Receiver<PersistStatus> {
        self.writer.subscribe()
    }

    /// Waits for all writes issued so far to reach storage.
    pub async fn flush(&self) -> PersistStatus {
        self.writer.flush().await
    }

    fn persist(&self) {
        match encode_items(&self.items) {
            Ok(value) => {
                self.writer.enqueue(&self.config.storage_key, value);
            }
            Err(err) => self.writer.report_failure(err.to_string()),
        }
    }
}

async fn load_items(storage: &dyn StorageAdapter, key: &str) -> StorageResult<Vec<Item>> {
    match storage.load(key).await? {
        Some(value) => decode_items(key, value),
        None => Ok(Vec::new()),
    }
}
