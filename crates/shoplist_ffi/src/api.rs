//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the shopping list use-cases to Dart via FRB.
//! - Own the process-wide list store and the runtime driving its writes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All list mutations go through one `Mutex<ListStore>`, so concurrent
//!   callers observe single-writer semantics.
//! - The UI passes names and ids only; item records never cross inbound.

use log::error;
use once_cell::sync::OnceCell;
use shoplist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Item, ListStore, SqliteStorage, StoreConfig,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::runtime::{Builder, Runtime};

const LIST_DB_FILE_NAME: &str = "shoplist.sqlite3";
const LIST_DB_PATH_ENV: &str = "SHOPLIST_DB_PATH";
static LIST_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static LIST_STORE: OnceCell<Mutex<ListStore>> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the ordered list as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemView {
    pub id: String,
    pub name: String,
    pub is_completed: bool,
    /// Epoch milliseconds; `None` while the item is open.
    pub completed_at_ms: Option<i64>,
    pub last_updated_ms: i64,
}

/// Ordered list snapshot envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewResponse {
    /// Items in display order.
    pub items: Vec<ListItemView>,
    pub open_count: u32,
    pub completed_count: u32,
    /// Empty on success, error text when the store could not be opened.
    pub message: String,
}

/// Result envelope for add/toggle/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListActionResponse {
    /// `false` only when the store itself is unusable.
    pub ok: bool,
    /// Whether the list changed; blank names and unknown ids leave it as is.
    pub changed: bool,
    /// Created, toggled or deleted item id.
    pub item_id: Option<String>,
    pub message: String,
}

impl ListActionResponse {
    fn changed(message: impl Into<String>, item_id: String) -> Self {
        Self {
            ok: true,
            changed: true,
            item_id: Some(item_id),
            message: message.into(),
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed: false,
            item_id: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            item_id: None,
            message: message.into(),
        }
    }
}

/// Persistence progress envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPersistResponse {
    /// `true` when no write failed since the store opened.
    pub ok: bool,
    pub issued: u64,
    pub completed: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

/// Adds an item from the list input field.
///
/// # FFI contract
/// - Sync call; storage write happens in the background.
/// - Blank input returns `changed=false`, never an error.
#[flutter_rust_bridge::frb(sync)]
pub fn list_add(name: String) -> ListActionResponse {
    match with_list_store(|store| store.add(&name)) {
        Ok(Some(item_id)) => ListActionResponse::changed("Item added.", item_id.to_string()),
        Ok(None) => ListActionResponse::unchanged("Nothing to add."),
        Err(err) => ListActionResponse::failure(format!("list_add failed: {err}")),
    }
}

/// Flips completion of one item.
///
/// # FFI contract
/// - Sync call; storage write happens in the background.
/// - Unknown ids return `changed=false`, never an error.
#[flutter_rust_bridge::frb(sync)]
pub fn list_toggle_complete(id: String) -> ListActionResponse {
    match with_list_store(|store| store.toggle_complete(&id)) {
        Ok(true) => ListActionResponse::changed("Item updated.", id),
        Ok(false) => ListActionResponse::unchanged("Item not found."),
        Err(err) => ListActionResponse::failure(format!("list_toggle_complete failed: {err}")),
    }
}

/// Deletes one item permanently.
///
/// # FFI contract
/// - Sync call; storage write happens in the background.
/// - Unknown ids return `changed=false`, never an error.
#[flutter_rust_bridge::frb(sync)]
pub fn list_delete(id: String) -> ListActionResponse {
    match with_list_store(|store| store.delete(&id)) {
        Ok(true) => ListActionResponse::changed("Item deleted.", id),
        Ok(false) => ListActionResponse::unchanged("Item not found."),
        Err(err) => ListActionResponse::failure(format!("list_delete failed: {err}")),
    }
}

/// Returns the list in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_view() -> ListViewResponse {
    match with_list_store(|store| (store.current_ordered_view(), store.counts())) {
        Ok((items, counts)) => ListViewResponse {
            items: items.iter().map(to_list_item_view).collect(),
            open_count: saturating_u32(counts.open),
            completed_count: saturating_u32(counts.completed),
            message: String::new(),
        },
        Err(err) => ListViewResponse {
            items: Vec::new(),
            open_count: 0,
            completed_count: 0,
            message: format!("list_view failed: {err}"),
        },
    }
}

/// Blocks until queued writes reach storage and reports persistence status.
///
/// Intended for app pause/shutdown hooks.
#[flutter_rust_bridge::frb(sync)]
pub fn list_flush() -> ListPersistResponse {
    let status = runtime().and_then(|runtime| {
        with_list_store(|store| runtime.block_on(store.flush()))
    });
    match status {
        Ok(status) => ListPersistResponse {
            ok: status.failed == 0,
            issued: status.issued,
            completed: status.completed,
            failed: status.failed,
            last_error: status.last_error,
        },
        Err(err) => ListPersistResponse {
            ok: false,
            issued: 0,
            completed: 0,
            failed: 0,
            last_error: Some(format!("list_flush failed: {err}")),
        },
    }
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("shoplist-writer")
            .enable_all()
            .build()
            .map_err(|err| format!("runtime start failed: {err}"))
    })
}

fn resolve_list_db_path() -> PathBuf {
    LIST_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(LIST_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LIST_DB_FILE_NAME)
        })
        .clone()
}

fn with_list_store<T>(f: impl FnOnce(&mut ListStore) -> T) -> Result<T, String> {
    let store = LIST_STORE.get_or_try_init(|| {
        let runtime = runtime()?;
        let storage = SqliteStorage::open(resolve_list_db_path())
            .map_err(|err| format!("list storage open failed: {err}"))?;
        let store = runtime
            .block_on(ListStore::open(Arc::new(storage), StoreConfig::default()))
            .map_err(|err| format!("list store open failed: {err}"))?;
        Ok::<_, String>(Mutex::new(store))
    })?;

    let mut guard = store.lock().map_err(|_| {
        error!("event=ffi_call module=ffi status=error error_code=store_lock_poisoned");
        "list store lock poisoned".to_string()
    })?;
    Ok(f(&mut guard))
}

fn to_list_item_view(item: &Item) -> ListItemView {
    ListItemView {
        id: item.id.to_string(),
        name: item.name.clone(),
        is_completed: item.is_completed(),
        completed_at_ms: item.completed_at_ms,
        last_updated_ms: item.last_updated_ms,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, list_add, list_delete, list_flush, list_toggle_complete,
        list_view, ping, LIST_DB_FILE_NAME, LIST_DB_PATH,
    };
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    static SCRATCH_DIR: OnceLock<TempDir> = OnceLock::new();

    /// Points the process-wide store at a per-run scratch database.
    ///
    /// Must run before the first list call in every test that touches the store.
    fn use_scratch_db() {
        let dir = SCRATCH_DIR.get_or_init(|| tempfile::tempdir().unwrap());
        let path = LIST_DB_PATH.get_or_init(|| dir.path().join(LIST_DB_FILE_NAME));
        assert!(path.starts_with(dir.path()), "store opened before scratch db");
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/shoplist-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn list_add_then_view_contains_item() {
        use_scratch_db();
        let name = unique_token("ffi-add");
        let added = list_add(format!("  {name}  "));
        assert!(added.ok && added.changed, "{}", added.message);
        let item_id = added.item_id.expect("add should return item_id");

        let view = list_view();
        assert!(view.message.is_empty(), "{}", view.message);
        let row = view
            .items
            .iter()
            .find(|item| item.id == item_id)
            .expect("added item should be listed");
        assert_eq!(row.name, name);
        assert!(!row.is_completed);
    }

    #[test]
    fn blank_add_and_unknown_ids_are_unchanged() {
        use_scratch_db();
        let blank = list_add("   ".to_string());
        assert!(blank.ok);
        assert!(!blank.changed);

        let missing = unique_token("missing");
        assert!(!list_toggle_complete(missing.clone()).changed);
        assert!(!list_delete(missing).changed);
    }

    #[test]
    fn toggle_and_delete_round_trip_persists() {
        use_scratch_db();
        let added = list_add(unique_token("ffi-toggle"));
        let item_id = added.item_id.expect("add should return item_id");

        let toggled = list_toggle_complete(item_id.clone());
        assert!(toggled.changed, "{}", toggled.message);
        let view = list_view();
        let row = view
            .items
            .iter()
            .find(|item| item.id == item_id)
            .expect("toggled item should be listed");
        assert!(row.is_completed);
        assert!(row.completed_at_ms.is_some());

        assert!(list_delete(item_id.clone()).changed);
        assert!(list_view().items.iter().all(|item| item.id != item_id));

        let persisted = list_flush();
        assert!(persisted.ok, "{:?}", persisted.last_error);
        assert!(persisted.issued >= 3);
    }

    #[test]
    fn list_calls_use_the_scratch_database() {
        use_scratch_db();
        assert!(list_view().message.is_empty());
        let path = LIST_DB_PATH.get().unwrap();
        assert_ne!(path, &std::env::temp_dir().join(LIST_DB_FILE_NAME));
        assert!(path.exists());
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
