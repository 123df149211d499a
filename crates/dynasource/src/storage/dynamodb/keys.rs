//! Key attribute resolution for start keys.
//!
//! A start key may be a whole item (the paginators hand back the last item
//! they returned). DynamoDB only accepts the key attributes of the table, and
//! of the index when one is read, so start keys are projected before use.
//! Attributes come from configuration when the table is named there and from
//! `DescribeTable` otherwise; described schemas are cached per table and index.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{KeySchemaElement, TableDescription};
use aws_sdk_dynamodb::Client;
use tokio::sync::RwLock;
use tracing::debug;

use dynasource_core::source::{Result, SourceError};

use super::error::map_describe_table_error;

type SchemaKey = (String, Option<String>);

/// Key attributes per table, from configuration or `DescribeTable`.
#[derive(Debug, Default)]
pub struct KeyAttributes {
    configured: HashMap<String, Vec<String>>,
    described: RwLock<HashMap<SchemaKey, Vec<String>>>,
}

impl KeyAttributes {
    pub fn new(configured: HashMap<String, Vec<String>>) -> Self {
        Self {
            configured,
            described: RwLock::default(),
        }
    }

    pub fn configure(&mut self, table: String, attributes: Vec<String>) {
        self.configured.insert(table, attributes);
    }

    /// Key attributes a start key for `table` (and `index`) must carry.
    pub async fn resolve(
        &self,
        client: &Client,
        table: &str,
        index: Option<&str>,
    ) -> Result<Vec<String>> {
        if let Some(attributes) = self.configured.get(table) {
            return Ok(attributes.clone());
        }

        let key = (table.to_string(), index.map(str::to_string));
        if let Some(attributes) = self.described.read().await.get(&key) {
            return Ok(attributes.clone());
        }

        let output = client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(map_describe_table_error)?;
        let description = output.table().ok_or_else(|| {
            SourceError::transport(format!("DescribeTable returned no table for {table}"))
        })?;
        let attributes = key_attributes(description, index)?;

        debug!(table, index, attributes = ?attributes, "Key schema described");
        self.remember(key, attributes.clone()).await;
        Ok(attributes)
    }

    async fn remember(&self, key: SchemaKey, attributes: Vec<String>) {
        self.described.write().await.insert(key, attributes);
    }
}

/// Table key attributes followed by the key attributes of `index`.
pub fn key_attributes(
    description: &TableDescription,
    index: Option<&str>,
) -> Result<Vec<String>> {
    let mut attributes = names(description.key_schema());

    if let Some(index) = index {
        let schema = description
            .global_secondary_indexes()
            .iter()
            .find(|gsi| gsi.index_name() == Some(index))
            .map(|gsi| gsi.key_schema())
            .or_else(|| {
                description
                    .local_secondary_indexes()
                    .iter()
                    .find(|lsi| lsi.index_name() == Some(index))
                    .map(|lsi| lsi.key_schema())
            })
            .ok_or_else(|| {
                SourceError::transport(format!(
                    "Index {index} not found on table {}",
                    description.table_name().unwrap_or_default()
                ))
            })?;

        for name in names(schema) {
            if !attributes.contains(&name) {
                attributes.push(name);
            }
        }
    }

    Ok(attributes)
}

fn names(schema: &[KeySchemaElement]) -> Vec<String> {
    schema
        .iter()
        .map(|element| element.attribute_name().to_string())
        .collect()
}
