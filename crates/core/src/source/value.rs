//! Typed attribute values in the store's wire representation.
//!
//! Values serialize as DynamoDB JSON (`{"S": "abc"}`) and convert to and
//! from plain JSON for callers that do not care about wire types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Result, SourceError};

/// An item (or key) as stored: attribute name to typed value.
pub type Item = HashMap<String, AttributeValue>;

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as decimal strings.
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Convert a plain JSON value into a typed attribute value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null(true),
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::N(n.to_string()),
            Value::String(s) => Self::S(s.clone()),
            Value::Array(values) => Self::L(values.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into plain JSON, dropping wire type information.
    pub fn to_json(&self) -> Value {
        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => number_to_json(n),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null(_) => Value::Null,
            Self::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
            Self::Ns(values) => Value::Array(values.iter().map(|n| number_to_json(n)).collect()),
            Self::L(values) => Value::Array(values.iter().map(Self::to_json).collect()),
            Self::M(map) => Value::Object(map_to_json(map)),
        }
    }
}

/// Parse a plain JSON object into an item.
pub fn item_from_json(value: &Value) -> Result<Item> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect()),
        other => Err(SourceError::InvalidData(format!(
            "Expected a JSON object, got: {}",
            other
        ))),
    }
}

/// Render an item as a plain JSON object.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(map_to_json(item))
}

fn map_to_json(item: &Item) -> Map<String, Value> {
    item.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

// Integers stay integers; anything JSON cannot represent stays a string.
fn number_to_json(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::from(i);
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_from_plain_json() {
        let item = item_from_json(&json!({
            "uuid": "e7362c92",
            "total": 42,
            "paid": false,
            "notes": null,
            "tags": ["a", "b"],
        }))
        .unwrap();

        assert_eq!(item["uuid"], AttributeValue::S("e7362c92".to_string()));
        assert_eq!(item["total"], AttributeValue::N("42".to_string()));
        assert_eq!(item["paid"], AttributeValue::Bool(false));
        assert!(item["notes"].is_null());
        assert_eq!(
            item["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("a".to_string()),
                AttributeValue::S("b".to_string()),
            ])
        );
    }

    #[test]
    fn test_item_from_json_rejects_non_objects() {
        let err = item_from_json(&json!(["uuid"])).unwrap_err();
        assert!(matches!(err, SourceError::InvalidData(_)));
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(AttributeValue::N("7".to_string()).to_json(), json!(7));
        assert_eq!(AttributeValue::N("2.5".to_string()).to_json(), json!(2.5));
        assert_eq!(
            AttributeValue::N("1e400".to_string()).to_json(),
            json!("1e400")
        );
    }

    #[test]
    fn test_wire_format_serialization() {
        let value = AttributeValue::M(HashMap::from([(
            "record_type".to_string(),
            AttributeValue::S("invoice".to_string()),
        )]));
        let wire = serde_json::to_value(&value).unwrap();
        assert_eq!(wire, json!({"M": {"record_type": {"S": "invoice"}}}));

        let parsed: AttributeValue =
            serde_json::from_value(json!({"BOOL": true})).unwrap();
        assert_eq!(parsed, AttributeValue::Bool(true));
    }
}
