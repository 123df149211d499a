//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the `StoreClient`
//! trait. Tables are declared up front with their key attributes and a
//! physical page size, so pagination behaves like a small DynamoDB table.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynasource::storage::inmemory::{InMemoryStore, TableSpec};
//!
//! let store = InMemoryStore::new([TableSpec::new("traffic", ["uuid"]).with_page_size(4)]);
//! // Use store for testing...
//! ```

mod expression;
mod store;

pub use expression::{ConditionExpression, UpdateExpression};
pub use store::{InMemoryStore, TableSpec, DEFAULT_PAGE_SIZE};
