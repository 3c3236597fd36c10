//! Domain model for the shopping list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod item;
