//! Flutter bridge surface for the shopping list core.

pub mod api;
