//! DynamoDB store client.
//!
//! Implements [`StoreClient`] from `dynasource_core::source` using the AWS SDK.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValue;
use aws_sdk_dynamodb::Client;
use tracing::info;

use dynasource_core::source::{
    Item, PageRequest, PageSource, Result, SourceError, StoreClient, WriteResponse,
};

use super::conversions::{item_from_sdk, item_to_sdk};
use super::error::{map_get_item_error, map_put_item_error, map_update_item_error};
use super::keys::KeyAttributes;
use super::pages::DynamoPages;
use crate::config::Config;

/// DynamoDB-backed store client.
///
/// The SDK client is built once and shared by every operation.
#[derive(Debug)]
pub struct DynamoDbClient {
    client: Client,
    key_attributes: KeyAttributes,
}

impl DynamoDbClient {
    /// Wraps an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            key_attributes: KeyAttributes::default(),
        }
    }

    /// Declares the key attributes of `table`, skipping the `DescribeTable`
    /// lookup otherwise used to reduce start keys for it.
    pub fn with_key_attributes(
        mut self,
        table: impl Into<String>,
        attributes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.key_attributes.configure(
            table.into(),
            attributes.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Builds the SDK client from the default credential chain, honoring the
    /// configured region and endpoint override.
    ///
    /// # Errors
    ///
    /// `Connection` when no credentials provider could be configured.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
        }

        let sdk_config = sdk_config_loader.load().await;
        if sdk_config.credentials_provider().is_none() {
            return Err(SourceError::Connection {
                message: "dynamodb wrong credentials".to_string(),
                cause: Some("no credentials provider in the default chain".to_string()),
            });
        }

        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref(),
            "DynamoDB client configured"
        );

        Ok(Self {
            client: Client::new(&sdk_config),
            key_attributes: KeyAttributes::new(config.key_attributes.clone()),
        })
    }
}

#[async_trait]
impl StoreClient for DynamoDbClient {
    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(item_to_sdk(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.map(item_from_sdk).transpose()
    }

    async fn put_item(&self, table: &str, item: &Item) -> Result<WriteResponse> {
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item_to_sdk(item)))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(WriteResponse::ok(format!("{result:?}")))
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Item,
        expression: &str,
        values: &Item,
    ) -> Result<WriteResponse> {
        let result = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(item_to_sdk(key)))
            .update_expression(expression)
            .set_expression_attribute_values((!values.is_empty()).then(|| item_to_sdk(values)))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_update_item_error)?;

        Ok(WriteResponse::ok(format!("{:?}", result.attributes)))
    }

    fn paginate(&self, request: PageRequest) -> Box<dyn PageSource<Item> + '_> {
        Box::new(DynamoPages::new(&self.client, &self.key_attributes, request))
    }
}
