//! Use-case layer.
//!
//! # Responsibility
//! - Orchestrate list mutations, ordering and persistence.
//! - Keep storage details behind the `StorageAdapter` contract.

pub mod list_ops;
pub mod list_store;
