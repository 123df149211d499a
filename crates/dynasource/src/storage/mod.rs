//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `StoreClient` trait
//! defined in `dynasource_core::source`. The implementations are selected at
//! compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//! - `inmemory` (default): in-memory backend for tests and local experiments
//!
//! Both may be enabled together; callers pick one when constructing a
//! `DataSource`.

#[cfg(not(any(feature = "dynamodb", feature = "inmemory")))]
compile_error!(
    "No storage backend selected. Enable 'dynamodb' or 'inmemory' feature. \
    Example: cargo build -p dynasource --features dynamodb"
);

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbClient;

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryStore, TableSpec};
