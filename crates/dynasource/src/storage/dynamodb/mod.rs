//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the `StoreClient`
//! trait using `aws-sdk-dynamodb`.

mod client;
mod conversions;
mod error;
mod keys;
mod pages;

pub use client::DynamoDbClient;
pub use conversions::project_key;
