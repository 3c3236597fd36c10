//! Pure list transitions and blob codec.
//!
//! # Responsibility
//! - Map `(current items, command, now)` to the next ordered item sequence.
//! - Encode/decode the persisted list blob.
//!
//! # Invariants
//! - Transitions never mutate their input; `None` means "no-op".
//! - Every returned sequence is ordered and free of duplicate ids.
//! - Decoded blobs are validated per entry; invalid entries are dropped and
//!   duplicates keep their first occurrence.

use crate::clock::IdGenerator;
use crate::model::item::{Item, ItemId};
use crate::ordering::{order_items, sort_items};
use crate::storage::{StorageError, StorageResult};
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

/// Candidate ids drawn before falling back to suffix disambiguation.
const MAX_ID_DRAWS: usize = 8;

/// User-level mutation on the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Add { name: String },
    ToggleComplete { id: ItemId },
    Delete { id: ItemId },
}

impl ListCommand {
    /// Stable operation label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::ToggleComplete { .. } => "toggle_complete",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Result of an applied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Next ordered item sequence.
    pub items: Vec<Item>,
    /// Item created, toggled or removed by the command.
    pub item_id: ItemId,
}

/// Applies `command` to `items` at instant `now_ms`.
///
/// Returns `None` for blank adds and for toggles/deletes of unknown ids.
pub fn apply_command(
    items: &[Item],
    command: &ListCommand,
    now_ms: i64,
    ids: &dyn IdGenerator,
) -> Option<Transition> {
    match command {
        ListCommand::Add { name } => {
            if name.trim().is_empty() {
                return None;
            }
            let item = Item::new(fresh_id(items, ids), name, now_ms).ok()?;
            let item_id = item.id.clone();
            let next = order_items(std::iter::once(item).chain(items.iter().cloned()));
            Some(Transition {
                items: next,
                item_id,
            })
        }
        ListCommand::ToggleComplete { id } => {
            let index = items.iter().position(|item| &item.id == id)?;
            let mut next = items.to_vec();
            next[index].toggle_complete(now_ms);
            sort_items(&mut next);
            Some(Transition {
                items: next,
                item_id: id.clone(),
            })
        }
        ListCommand::Delete { id } => {
            if !items.iter().any(|item| &item.id == id) {
                return None;
            }
            let next = items
                .iter()
                .filter(|item| &item.id != id)
                .cloned()
                .collect();
            Some(Transition {
                items: next,
                item_id: id.clone(),
            })
        }
    }
}

/// Draws an id not held by any item in `items`.
fn fresh_id(items: &[Item], ids: &dyn IdGenerator) -> ItemId {
    let held = items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<HashSet<_>>();
    let usable = |id: &ItemId| !id.as_str().trim().is_empty() && !held.contains(id.as_str());

    let mut candidate = ids.next_id();
    for _ in 1..MAX_ID_DRAWS {
        if usable(&candidate) {
            return candidate;
        }
        candidate = ids.next_id();
    }
    if usable(&candidate) {
        return candidate;
    }

    warn!("event=id_collision module=list_ops status=fallback draws={MAX_ID_DRAWS}");
    let base = candidate.to_string();
    (1u64..)
        .map(|n| ItemId::new(format!("{base}-{n}")))
        .find(|id| usable(id))
        .unwrap_or(candidate)
}

/// Encodes the full item sequence as the persisted blob.
pub fn encode_items(items: &[Item]) -> StorageResult<Value> {
    serde_json::to_value(items).map_err(StorageError::Serialization)
}

/// Decodes a persisted blob into an ordered, duplicate-free sequence.
///
/// Entries that do not decode or fail validation are dropped, and so are
/// later duplicates of an id; both are counted in one `warn` line.
///
/// # Errors
/// - `StorageError::Corrupt` when the blob is not an array.
pub fn decode_items(key: &str, value: Value) -> StorageResult<Vec<Item>> {
    let entries = serde_json::from_value::<Vec<Value>>(value).map_err(|err| {
        StorageError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        }
    })?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());
    let mut invalid = 0usize;
    let mut duplicates = 0usize;
    for entry in entries {
        let item = match serde_json::from_value::<Item>(entry) {
            Ok(item) if item.validate().is_ok() => item,
            _ => {
                invalid += 1;
                continue;
            }
        };
        if seen.insert(item.id.clone()) {
            items.push(item);
        } else {
            duplicates += 1;
        }
    }
    if invalid > 0 || duplicates > 0 {
        warn!(
            "event=hydrate module=list_ops status=dropped invalid={invalid} duplicates={duplicates} kept={}",
            items.len()
        );
    }

    sort_items(&mut items);
    Ok(items)
}
