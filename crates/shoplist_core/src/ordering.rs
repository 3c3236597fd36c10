//! Display ordering policy for list items.
//!
//! # Responsibility
//! - Define the total order the UI renders items in.
//!
//! # Invariants
//! - Open items always sort before completed items.
//! - Completed items sort by `completed_at_ms` descending.
//! - Open items sort by `last_updated_ms` descending.
//! - Items with equal keys compare `Equal`; their relative order is unspecified.

use crate::model::item::Item;
use std::cmp::Ordering;

/// Compares two items for display order.
///
/// Pure and deterministic: the result depends only on the completion and
/// update stamps of both items.
pub fn compare_items(left: &Item, right: &Item) -> Ordering {
    match (left.completed_at_ms, right.completed_at_ms) {
        (Some(left_done), Some(right_done)) => right_done.cmp(&left_done),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => right.last_updated_ms.cmp(&left.last_updated_ms),
    }
}

/// Sorts `items` in place by [`compare_items`].
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(compare_items);
}

/// Returns a new vector ordered by [`compare_items`].
pub fn order_items(items: impl IntoIterator<Item = Item>) -> Vec<Item> {
    let mut ordered = items.into_iter().collect::<Vec<_>>();
    sort_items(&mut ordered);
    ordered
}
