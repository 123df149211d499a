//! Manual query and scan paginator.
//!
//! Pages are requested one at a time, feeding each `LastEvaluatedKey` back
//! as the next `ExclusiveStartKey`.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use dynasource_core::source::{Item, PageKind, PageRequest, PageSource, RawPage, Result};

use super::conversions::{item_from_sdk, item_to_sdk, project_key};
use super::error::{map_query_error, map_scan_error};
use super::keys::KeyAttributes;

/// Lazily pages through one query or scan.
pub struct DynamoPages<'a> {
    client: &'a Client,
    keys: &'a KeyAttributes,
    request: PageRequest,
    next_key: Option<Item>,
    started: bool,
    exhausted: bool,
}

impl<'a> DynamoPages<'a> {
    pub fn new(client: &'a Client, keys: &'a KeyAttributes, mut request: PageRequest) -> Self {
        let next_key = request.start_key.take();
        Self {
            client,
            keys,
            request,
            next_key,
            started: false,
            exhausted: false,
        }
    }

    /// Reduces a caller-supplied start key to the key attributes. Later keys
    /// come from DynamoDB and are already reduced.
    async fn project_start_key(&mut self) -> Result<()> {
        self.started = true;
        if let Some(key) = self.next_key.take() {
            let attributes = self
                .keys
                .resolve(
                    self.client,
                    &self.request.table,
                    self.request.index_name.as_deref(),
                )
                .await?;
            self.next_key = Some(project_key(key, &attributes));
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<RawPage> {
        let request = &self.request;
        let start_key = self.next_key.as_ref().map(item_to_sdk);
        let values = request.values.as_ref().map(item_to_sdk);
        let limit = request
            .page_size
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX));

        let (items, count, last_key) = match request.kind {
            PageKind::Query => {
                let output = self
                    .client
                    .query()
                    .table_name(&request.table)
                    .set_index_name(request.index_name.clone())
                    .set_key_condition_expression(request.key_condition.clone())
                    .set_filter_expression(request.filter.clone())
                    .set_expression_attribute_names(request.attribute_names.clone())
                    .set_expression_attribute_values(values)
                    .set_exclusive_start_key(start_key)
                    .set_limit(limit)
                    .send()
                    .await
                    .map_err(map_query_error)?;
                (output.items, output.count, output.last_evaluated_key)
            }
            PageKind::Scan => {
                let output = self
                    .client
                    .scan()
                    .table_name(&request.table)
                    .set_index_name(request.index_name.clone())
                    .set_filter_expression(request.filter.clone())
                    .set_expression_attribute_names(request.attribute_names.clone())
                    .set_expression_attribute_values(values)
                    .set_exclusive_start_key(start_key)
                    .set_limit(limit)
                    .send()
                    .await
                    .map_err(map_scan_error)?;
                (output.items, output.count, output.last_evaluated_key)
            }
        };

        let items = items
            .unwrap_or_default()
            .into_iter()
            .map(item_from_sdk)
            .collect::<Result<Vec<_>>>()?;
        let count = usize::try_from(count).unwrap_or(items.len());
        let continuation = last_key.map(item_from_sdk).transpose()?;

        Ok(RawPage {
            items,
            count,
            continuation,
        })
    }
}

#[async_trait]
impl<'a> PageSource<Item> for DynamoPages<'a> {
    async fn next_page(&mut self) -> Option<Result<RawPage>> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            if let Err(e) = self.project_start_key().await {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        let page = self.fetch().await;
        match &page {
            Ok(page) => {
                debug!(
                    table = %self.request.table,
                    kind = %self.request.kind,
                    records = page.items.len(),
                    count = page.count,
                    more = page.has_more(),
                    "DynamoDB page fetched"
                );
                self.next_key = page.continuation.clone();
                self.exhausted = self.next_key.is_none();
            }
            Err(_) => self.exhausted = true,
        }

        Some(page)
    }
}
