//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between SDK `AttributeValue` maps and the
//! store-neutral [`Item`]. These are testable in isolation without DynamoDB
//! access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as SdkValue;
use dynasource_core::source::{AttributeValue, Item, Result, SourceError};

/// Convert an SDK item into an [`Item`].
pub fn item_from_sdk(item: HashMap<String, SdkValue>) -> Result<Item> {
    item.into_iter()
        .map(|(name, value)| {
            let value = value_from_sdk(value).map_err(|e| match e {
                SourceError::InvalidData(reason) => {
                    SourceError::InvalidData(format!("Attribute '{name}': {reason}"))
                }
                e => e,
            })?;
            Ok((name, value))
        })
        .collect()
}

/// Convert an [`Item`] into an SDK item.
pub fn item_to_sdk(item: &Item) -> HashMap<String, SdkValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), value_to_sdk(value)))
        .collect()
}

/// Keep only `attributes` of `item`. Used to turn an item-shaped start key
/// into a real key.
pub fn project_key(item: Item, attributes: &[String]) -> Item {
    item.into_iter()
        .filter(|(name, _)| attributes.contains(name))
        .collect()
}

fn value_from_sdk(value: SdkValue) -> Result<AttributeValue> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::Null(b) => AttributeValue::Null(b),
        SdkValue::Ss(values) => AttributeValue::Ss(values),
        SdkValue::Ns(values) => AttributeValue::Ns(values),
        SdkValue::L(values) => AttributeValue::L(
            values
                .into_iter()
                .map(value_from_sdk)
                .collect::<Result<_>>()?,
        ),
        SdkValue::M(map) => AttributeValue::M(item_from_sdk(map)?),
        SdkValue::B(_) | SdkValue::Bs(_) => {
            return Err(SourceError::InvalidData(
                "binary attributes are not supported".to_string(),
            ))
        }
        other => {
            return Err(SourceError::InvalidData(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    })
}

fn value_to_sdk(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Null(b) => SdkValue::Null(*b),
        AttributeValue::Ss(values) => SdkValue::Ss(values.clone()),
        AttributeValue::Ns(values) => SdkValue::Ns(values.clone()),
        AttributeValue::L(values) => SdkValue::L(values.iter().map(value_to_sdk).collect()),
        AttributeValue::M(map) => SdkValue::M(item_to_sdk(map)),
    }
}
