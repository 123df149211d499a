//! dynasource_core - store-agnostic building blocks for dynasource.
//!
//! - [`source`]: wire values, pages, result envelopes, the error taxonomy and
//!   the traits a store backend implements.
//! - [`pagination`]: accumulators that turn store pages into caller pages.
//! - [`model`]: statically declared attribute mapping for typed records.

pub mod model;
pub mod pagination;
pub mod source;
