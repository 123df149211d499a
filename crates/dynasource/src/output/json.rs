//! JSON output formatting.

use serde_json::{json, Value};

use dynasource_core::source::{item_to_json, ResultEnvelope};

/// Format a value as JSON.
pub fn format_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Plain-JSON rendering of an envelope, keeping the wire field names.
pub fn envelope_to_json(envelope: &ResultEnvelope) -> Value {
    json!({
        "Items": envelope.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "LastEvaluatedKey": envelope.last_evaluated_key.as_ref().map(item_to_json),
    })
}
