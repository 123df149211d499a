//! Paginated data access over DynamoDB.
//!
//! [`DataSource`] is the entry point: it wraps a storage backend from
//! [`storage`] and exposes single-item reads and writes, full-drain queries
//! and fixed-size scan pages. Shared types live in `dynasource_core` and are
//! re-exported here.

pub mod cli;
pub mod config;
pub mod output;
pub mod source;
pub mod storage;

pub use config::Config;
pub use source::DataSource;

pub use dynasource_core::model;
pub use dynasource_core::pagination::ScanStrategy;
pub use dynasource_core::source::{
    item_from_json, item_to_json, AttributeValue, Item, QueryParams, Result, ResultEnvelope,
    ScanParams, SourceError, StoreClient,
};
