//! Shopping list item model.
//!
//! # Responsibility
//! - Define the canonical record persisted in the list blob.
//! - Provide completion lifecycle helpers used by list transitions.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `completed_at_ms.is_some()` is the source of truth for completion.
//! - `name` is never blank.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque item identifier.
///
/// New ids are UUID v4 strings. Blobs written by earlier app versions carry
/// ISO-8601 timestamp ids, so the wire type stays a plain string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Validation errors for item invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    BlankId,
    BlankName { id: ItemId },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "item id must not be blank"),
            Self::BlankName { id } => write!(f, "item `{id}` has a blank name"),
        }
    }
}

impl Error for ItemValidationError {}

/// One checklist entry.
///
/// Timestamps are Unix epoch milliseconds. Field names on the wire match the
/// blob format already stored on user devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Present iff the item is completed.
    #[serde(
        rename = "completedAtTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at_ms: Option<i64>,
    /// Refreshed by creation and every toggle.
    #[serde(rename = "lastUpdatedTimeStamp")]
    pub last_updated_ms: i64,
}

impl Item {
    /// Creates an incomplete item stamped at `now_ms`.
    ///
    /// # Errors
    /// - Returns an error when `id` or the trimmed `name` is blank.
    pub fn new(
        id: ItemId,
        name: impl AsRef<str>,
        now_ms: i64,
    ) -> Result<Self, ItemValidationError> {
        let item = Self {
            id,
            name: name.as_ref().trim().to_string(),
            completed_at_ms: None,
            last_updated_ms: now_ms,
        };
        item.validate()?;
        Ok(item)
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ItemValidationError::BlankId);
        }
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at_ms.is_some()
    }

    /// Flips completion state and refreshes the update stamp.
    ///
    /// Completing stamps `completed_at_ms = now_ms`; reopening clears it.
    /// `last_updated_ms` is refreshed in both directions.
    pub fn toggle_complete(&mut self, now_ms: i64) {
        self.completed_at_ms = match self.completed_at_ms {
            Some(_) => None,
            None => Some(now_ms),
        };
        self.last_updated_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemId, ItemValidationError};

    #[test]
    fn new_trims_name_and_rejects_blank() {
        let item = Item::new(ItemId::from("a"), "  coffee ", 10).unwrap();
        assert_eq!(item.name, "coffee");
        assert_eq!(item.last_updated_ms, 10);
        assert!(!item.is_completed());

        let err = Item::new(ItemId::from("b"), " \t", 10).unwrap_err();
        assert_eq!(
            err,
            ItemValidationError::BlankName {
                id: ItemId::from("b")
            }
        );
    }

    #[test]
    fn toggle_round_trip_clears_completion() {
        let mut item = Item::new(ItemId::from("a"), "milk", 1).unwrap();
        item.toggle_complete(5);
        assert_eq!(item.completed_at_ms, Some(5));
        assert_eq!(item.last_updated_ms, 5);

        item.toggle_complete(9);
        assert_eq!(item.completed_at_ms, None);
        assert_eq!(item.last_updated_ms, 9);
    }
}
