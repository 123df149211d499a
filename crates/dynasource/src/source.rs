//! The data-access facade.
//!
//! [`DataSource`] wraps any [`StoreClient`] and exposes the caller-facing
//! operations: single-item reads and writes, full-drain queries and paged
//! scans. Every operation runs inside the source's tracing span.

use tracing::{error, info, info_span, warn, Instrument, Span};

use dynasource_core::pagination::{
    accumulate_scan, drain_pages, first_n, ScanStrategy, FIRST_PAGE_LEN,
};
use dynasource_core::source::{
    Item, QueryParams, Result, ResultEnvelope, ScanParams, SourceError, StoreClient, WriteResponse,
};

/// Data access over a store client.
pub struct DataSource<C> {
    client: C,
    span: Span,
    scan_strategy: ScanStrategy,
}

impl<C: StoreClient> DataSource<C> {
    /// Creates a data source logging under the `dynasource` span.
    pub fn new(client: C) -> Self {
        Self {
            client,
            span: info_span!("dynasource"),
            scan_strategy: ScanStrategy::default(),
        }
    }

    /// Replaces the span every operation is instrumented with.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_scan_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.scan_strategy = strategy;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn scan_strategy(&self) -> ScanStrategy {
        self.scan_strategy
    }

    /// Fetches exactly one item by its key.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` when no item has that key.
    pub async fn select_one(&self, table: &str, key: &Item) -> Result<Item> {
        async {
            info!(table, "Selecting one record");

            match self.client.get_item(table, key).await {
                Ok(Some(item)) => Ok(item),
                Ok(None) => {
                    warn!(table, "Record not found");
                    Err(SourceError::RecordNotFound)
                }
                Err(e) => {
                    error!(table, error = %e, cause = e.cause(), "GetItem failed");
                    Err(e)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Runs a query and drains every page.
    ///
    /// # Errors
    ///
    /// `Configuration` when the key condition or its values are missing,
    /// before anything is sent; `NoRecordsFound` when nothing matched.
    pub async fn select_many(&self, table: &str, params: QueryParams) -> Result<ResultEnvelope> {
        async {
            let request = params.into_request(table).inspect_err(|e| {
                error!(table, error = %e, "Invalid query");
            })?;
            info!(
                table,
                key_condition = request.key_condition.as_deref(),
                filter = request.filter.as_deref(),
                index = request.index_name.as_deref(),
                "Querying records"
            );

            let mut pages = self.client.paginate(request);
            let envelope = drain_pages(&mut *pages)
                .await
                .inspect_err(|e| log_read_error(table, e))?;

            info!(
                table,
                records = envelope.len(),
                more = envelope.has_more(),
                "Query finished"
            );
            Ok(envelope)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Scans one page of at most `page_size` items.
    ///
    /// Pass the returned `last_evaluated_key` as the next call's start key to
    /// read the following page.
    pub async fn scan_paged(
        &self,
        table: &str,
        params: ScanParams,
        page_size: usize,
    ) -> Result<ResultEnvelope> {
        async {
            if page_size == 0 {
                let err = SourceError::Configuration(
                    "Page size must be greater than zero".to_string(),
                );
                error!(table, error = %err, "Invalid scan");
                return Err(err);
            }
            let limit = u32::try_from(page_size).map_err(|_| {
                SourceError::Configuration(format!("Page size {page_size} is too large"))
            })?;

            let request = params.into_request(table, Some(limit));
            info!(
                table,
                page_size,
                strategy = %self.scan_strategy,
                filter = request.filter.as_deref(),
                resumed = request.start_key.is_some(),
                "Scanning records"
            );

            let mut pages = self.client.paginate(request);
            let envelope = accumulate_scan(&mut *pages, page_size, self.scan_strategy)
                .await
                .inspect_err(|e| log_read_error(table, e))?;

            info!(
                table,
                records = envelope.len(),
                more = envelope.has_more(),
                "Scan finished"
            );
            Ok(envelope)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Drains a scan and keeps the first ten items.
    ///
    /// When more than ten items matched, the tenth becomes the
    /// `last_evaluated_key`. With ten or fewer the envelope carries no key.
    pub async fn scan_first_n(&self, table: &str, params: ScanParams) -> Result<ResultEnvelope> {
        async {
            let request = params.into_request(table, None);
            info!(
                table,
                filter = request.filter.as_deref(),
                "Scanning first records"
            );

            let mut pages = self.client.paginate(request);
            let drained = drain_pages(&mut *pages)
                .await
                .inspect_err(|e| log_read_error(table, e))?;
            let envelope = first_n(drained, FIRST_PAGE_LEN);

            info!(
                table,
                records = envelope.len(),
                more = envelope.has_more(),
                "Scan finished"
            );
            Ok(envelope)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Writes an item, replacing any item with the same key.
    pub async fn add(&self, table: &str, item: &Item) -> Result<bool> {
        async {
            info!(table, attributes = item.len(), "Adding record");
            let response = self.client.put_item(table, item).await;
            check_write(table, "PutItem", response)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Applies an update expression to the item with `key`.
    pub async fn update(
        &self,
        table: &str,
        key: &Item,
        expression: &str,
        values: &Item,
    ) -> Result<bool> {
        async {
            info!(table, expression, "Updating record");
            let response = self.client.update_item(table, key, expression, values).await;
            check_write(table, "UpdateItem", response)
        }
        .instrument(self.span.clone())
        .await
    }
}

fn check_write(table: &str, operation: &str, response: Result<WriteResponse>) -> Result<bool> {
    match response {
        Ok(response) if response.is_success() => {
            info!(table, operation, "Write succeeded");
            Ok(true)
        }
        Ok(response) => {
            error!(
                table,
                operation,
                status = response.status,
                payload = %response.payload,
                "Write rejected"
            );
            Err(SourceError::transport(response.payload))
        }
        Err(e) => {
            error!(table, operation, error = %e, cause = e.cause(), "Write failed");
            Err(e)
        }
    }
}

fn log_read_error(table: &str, err: &SourceError) {
    if err.is_not_found() {
        warn!(table, "No records found");
    } else {
        error!(table, error = %err, cause = err.cause(), "Read failed");
    }
}
