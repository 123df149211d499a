//! Accumulators that turn a lazy sequence of store pages into one
//! caller-facing [`ResultEnvelope`](crate::source::ResultEnvelope).
//!
//! - [`accumulate_scan`]: at most `limit` items per call, resumable.
//! - [`drain_pages`]: every page, concatenated.
//! - [`first_n`]: the first-page compatibility truncation.

mod query;
mod scan;

pub use query::{drain_pages, first_n, FIRST_PAGE_LEN};
pub use scan::{accumulate_scan, ScanStrategy};
