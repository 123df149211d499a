//! Paged scans: re-chunking store pages into pages of a requested size.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::source::{PageSource, RawPage, Result, ResultEnvelope, SourceError};

/// How a paged scan reconciles store pages with the requested page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Keep every item across store pages in one buffer and slice it to the
    /// page size.
    #[default]
    Buffered,
    /// Seed with the first non-empty page, then top up with the first
    /// `limit - collected` items of each following page. Relies on the
    /// store honoring the page size as its per-request limit: a seed page
    /// larger than the limit is returned whole.
    Deficit,
}

impl ScanStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStrategy::Buffered => "buffered",
            ScanStrategy::Deficit => "deficit",
        }
    }
}

impl fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStrategy {
    type Err = SourceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buffered" => Ok(ScanStrategy::Buffered),
            "deficit" => Ok(ScanStrategy::Deficit),
            other => Err(SourceError::Configuration(format!(
                "Unknown scan strategy: {other} (expected 'buffered' or 'deficit')"
            ))),
        }
    }
}

/// Collects at most `limit` items from `pages` into one envelope.
///
/// The returned `last_evaluated_key` is the last collected item itself; the
/// caller passes it back as the start key of the next call.
///
/// A key only promises that the store had not finished scanning. When the
/// store filters items, the page that completes the envelope may end on the
/// last match while unscanned items remain, so a key can come back even
/// though no further item matches. The next call then yields nothing and
/// fails with `NoRecordsFound`.
///
/// # Errors
///
/// - `Configuration` when `limit` is zero.
/// - `NoRecordsFound` when the store is exhausted without yielding an item.
/// - Any error yielded by the page source.
pub async fn accumulate_scan<T, S>(
    pages: &mut S,
    limit: usize,
    strategy: ScanStrategy,
) -> Result<ResultEnvelope<T>>
where
    T: Clone + Send + 'static,
    S: PageSource<T> + ?Sized,
{
    if limit == 0 {
        return Err(SourceError::Configuration(
            "Page size must be greater than zero".to_string(),
        ));
    }

    let envelope = match strategy {
        ScanStrategy::Buffered => buffered(pages, limit).await?,
        ScanStrategy::Deficit => deficit(pages, limit).await?,
    };

    if envelope.is_empty() {
        return Err(SourceError::NoRecordsFound);
    }

    Ok(envelope)
}

async fn buffered<T, S>(pages: &mut S, limit: usize) -> Result<ResultEnvelope<T>>
where
    T: Clone + Send + 'static,
    S: PageSource<T> + ?Sized,
{
    let mut buffer: Vec<T> = Vec::with_capacity(limit);
    let mut page_number = 0usize;

    let more = loop {
        let Some(page) = pages.next_page().await else {
            break false;
        };
        let RawPage {
            items, continuation, ..
        } = page?;
        page_number += 1;
        debug!(page = page_number, records = items.len(), "Scan page received");

        buffer.extend(items);

        if buffer.len() > limit {
            buffer.truncate(limit);
            break true;
        }
        if continuation.is_none() {
            break false;
        }
        if buffer.len() == limit {
            break true;
        }
    };

    debug!(pages = page_number, records = buffer.len(), more, "Scan finished");
    Ok(finish(buffer, more))
}

async fn deficit<T, S>(pages: &mut S, limit: usize) -> Result<ResultEnvelope<T>>
where
    T: Clone + Send + 'static,
    S: PageSource<T> + ?Sized,
{
    let mut collected: Vec<T> = Vec::new();
    let mut missing = limit;
    let mut page_number = 0usize;

    let more = loop {
        let Some(page) = pages.next_page().await else {
            break false;
        };
        let page = page?;
        page_number += 1;
        debug!(
            page = page_number,
            records = page.items.len(),
            missing,
            "Scan page received"
        );

        let has_more = page.has_more();
        let mut left_behind = false;

        if collected.is_empty() {
            collected = page.items;
        } else {
            let received = page.items.len();
            let take = missing.min(page.count).min(received);
            left_behind = take < received;
            collected.extend(page.items.into_iter().take(take));
        }

        // Items dropped from the final page are still unread.
        if !has_more {
            break left_behind;
        }
        if collected.len() == limit {
            break true;
        }

        missing = limit.saturating_sub(collected.len());
    };

    debug!(
        pages = page_number,
        records = collected.len(),
        more,
        "Scan finished"
    );
    Ok(finish(collected, more))
}

fn finish<T: Clone>(items: Vec<T>, more: bool) -> ResultEnvelope<T> {
    let last_evaluated_key = if more { items.last().cloned() } else { None };
    ResultEnvelope::new(items, last_evaluated_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticPages;

    /// Builds pages of consecutive ids from `(len, has_more)` pairs. A page's
    /// continuation is the id of its last item.
    fn pages(layout: &[(u32, bool)]) -> StaticPages<u32> {
        let mut next = 1u32;
        let pages: Vec<RawPage<u32>> = layout
            .iter()
            .map(|&(len, has_more)| {
                let items: Vec<u32> = (next..next + len).collect();
                next += len;
                let continuation = if has_more { Some(next - 1) } else { None };
                RawPage::new(items, continuation)
            })
            .collect();
        StaticPages::new(pages)
    }

    async fn scan(
        layout: &[(u32, bool)],
        limit: usize,
        strategy: ScanStrategy,
    ) -> Result<ResultEnvelope<u32>> {
        accumulate_scan(&mut pages(layout), limit, strategy).await
    }

    #[tokio::test]
    async fn test_three_page_scenario_buffered() {
        let envelope = scan(&[(4, true), (3, true), (2, false)], 8, ScanStrategy::Buffered)
            .await
            .unwrap();

        assert_eq!(envelope.items, (1..=8).collect::<Vec<_>>());
        assert_eq!(envelope.last_evaluated_key, Some(8));
    }

    #[tokio::test]
    async fn test_three_page_scenario_deficit() {
        let envelope = scan(&[(4, true), (3, true), (2, false)], 8, ScanStrategy::Deficit)
            .await
            .unwrap();

        assert_eq!(envelope.items, (1..=8).collect::<Vec<_>>());
        assert_eq!(envelope.last_evaluated_key, Some(8));
    }

    #[tokio::test]
    async fn test_exhausted_before_limit() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            let envelope = scan(&[(3, true), (2, false)], 10, strategy).await.unwrap();
            assert_eq!(envelope.items, vec![1, 2, 3, 4, 5]);
            assert_eq!(envelope.last_evaluated_key, None);
        }
    }

    #[tokio::test]
    async fn test_limit_met_on_page_boundary_with_more_data() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            let mut source = pages(&[(2, true), (3, true), (4, false)]);
            let envelope = accumulate_scan(&mut source, 5, strategy).await.unwrap();

            assert_eq!(envelope.items, vec![1, 2, 3, 4, 5]);
            assert_eq!(envelope.last_evaluated_key, Some(5));
            // The third page is never requested.
            assert_eq!(source.remaining(), 1);
        }
    }

    #[tokio::test]
    async fn test_limit_met_on_final_page_boundary() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            let envelope = scan(&[(2, true), (3, false)], 5, strategy).await.unwrap();
            assert_eq!(envelope.items.len(), 5);
            assert_eq!(envelope.last_evaluated_key, None);
        }
    }

    #[tokio::test]
    async fn test_key_survives_filtered_tail_without_matches() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            // The store had more to scan, but nothing left matches the filter.
            let envelope = scan(&[(3, true)], 3, strategy).await.unwrap();
            assert_eq!(envelope.last_evaluated_key, Some(3));

            let mut resumed = StaticPages::new(vec![RawPage::new(Vec::<u32>::new(), None)]);
            let err = accumulate_scan(&mut resumed, 3, strategy).await.unwrap_err();
            assert_eq!(err, SourceError::NoRecordsFound);
        }
    }

    #[tokio::test]
    async fn test_buffered_slices_oversized_first_page() {
        let envelope = scan(&[(7, false)], 4, ScanStrategy::Buffered).await.unwrap();
        assert_eq!(envelope.items, vec![1, 2, 3, 4]);
        assert_eq!(envelope.last_evaluated_key, Some(4));
    }

    #[tokio::test]
    async fn test_deficit_returns_oversized_seed_page_whole() {
        let envelope = scan(&[(7, false)], 4, ScanStrategy::Deficit).await.unwrap();
        assert_eq!(envelope.items.len(), 7);
        assert_eq!(envelope.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_empty_pages_are_skipped() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            let envelope = scan(&[(0, true), (0, true), (3, true), (3, false)], 4, strategy)
                .await
                .unwrap();
            assert_eq!(envelope.items, vec![1, 2, 3, 4]);
            assert_eq!(envelope.last_evaluated_key, Some(4));
        }
    }

    #[tokio::test]
    async fn test_no_records_found() {
        for strategy in [ScanStrategy::Buffered, ScanStrategy::Deficit] {
            let err = scan(&[(0, true), (0, false)], 5, strategy)
                .await
                .unwrap_err();
            assert_eq!(err, SourceError::NoRecordsFound);

            let err = scan(&[], 5, strategy).await.unwrap_err();
            assert_eq!(err, SourceError::NoRecordsFound);
        }
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let err = scan(&[(3, false)], 0, ScanStrategy::Buffered)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_page_source_error_is_propagated() {
        let mut source = StaticPages::from_results(vec![
            Ok(RawPage::new(vec![1u32, 2], Some(2))),
            Err(SourceError::transport("Throughput exceeded, please retry")),
            Ok(RawPage::new(vec![3u32], None)),
        ]);

        let err = accumulate_scan(&mut source, 5, ScanStrategy::Buffered)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::transport("Throughput exceeded, please retry")
        );
    }

    #[tokio::test]
    async fn test_deficit_respects_store_count() {
        // A filtered page may report fewer matches than it carries.
        let mut source = StaticPages::new(vec![
            RawPage::new(vec![1u32, 2], Some(2)),
            RawPage {
                items: vec![3, 4, 5],
                count: 1,
                continuation: Some(5),
            },
            RawPage::new(vec![6], None),
        ]);

        let envelope = accumulate_scan(&mut source, 4, ScanStrategy::Deficit)
            .await
            .unwrap();
        assert_eq!(envelope.items, vec![1, 2, 3, 6]);
        assert_eq!(envelope.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_buffered_never_exceeds_limit() {
        let layouts: [&[(u32, bool)]; 4] = [
            &[(1, true), (1, true), (1, true), (1, false)],
            &[(5, true), (5, true), (5, false)],
            &[(3, true), (0, true), (6, false)],
            &[(2, false)],
        ];

        for layout in layouts {
            let total: u32 = layout.iter().map(|(len, _)| len).sum();
            for limit in 1..=12usize {
                let envelope = scan(layout, limit, ScanStrategy::Buffered).await.unwrap();
                assert!(envelope.len() <= limit);
                if total as usize >= limit {
                    assert_eq!(envelope.len(), limit);
                }
                assert_eq!(envelope.has_more(), (total as usize) > limit);
            }
        }
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("buffered".parse::<ScanStrategy>().unwrap(), ScanStrategy::Buffered);
        assert_eq!(" Deficit ".parse::<ScanStrategy>().unwrap(), ScanStrategy::Deficit);
        assert!("offset".parse::<ScanStrategy>().is_err());
        assert_eq!(ScanStrategy::default().to_string(), "buffered");
    }
}
