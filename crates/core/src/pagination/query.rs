//! Full-drain reads and the first-page compatibility truncation.

use tracing::debug;

use crate::source::{PageSource, Result, ResultEnvelope, SourceError};

/// Page length of the first-page compatibility scan.
pub const FIRST_PAGE_LEN: usize = 10;

/// Reads every page and concatenates the items in arrival order.
///
/// The continuation of the final page (normally none) becomes the envelope's
/// `last_evaluated_key`.
///
/// # Errors
///
/// `NoRecordsFound` when no page carried an item; any page-source error.
pub async fn drain_pages<T, S>(pages: &mut S) -> Result<ResultEnvelope<T>>
where
    T: Send + 'static,
    S: PageSource<T> + ?Sized,
{
    let mut items = Vec::new();
    let mut last_evaluated_key = None;
    let mut page_number = 0usize;

    while let Some(page) = pages.next_page().await {
        let page = page?;
        page_number += 1;
        debug!(page = page_number, records = page.items.len(), "Page received");

        items.extend(page.items);
        last_evaluated_key = page.continuation;
    }

    debug!(pages = page_number, records = items.len(), "Pages drained");

    if items.is_empty() {
        return Err(SourceError::NoRecordsFound);
    }

    Ok(ResultEnvelope::new(items, last_evaluated_key))
}

/// Truncates a drained envelope to its first `n` items.
///
/// When items are cut off, the `n`th item becomes the `last_evaluated_key`.
/// That key is an item, not a store token, so resuming from it only works
/// for callers that keep using the same page length.
pub fn first_n<T: Clone>(envelope: ResultEnvelope<T>, n: usize) -> ResultEnvelope<T> {
    if envelope.len() <= n {
        return envelope;
    }

    let mut items = envelope.items;
    items.truncate(n);
    let last_evaluated_key = items.last().cloned();
    ResultEnvelope::new(items, last_evaluated_key)
}
