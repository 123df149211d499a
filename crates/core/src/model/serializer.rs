use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{FieldValue, ModelError, Record};

/// Renders records as JSON objects for API consumers.
///
/// Output keys are the field's label when one is set, otherwise the
/// lowerCamelCase form of the field name.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    fields: Vec<String>,
    labels: HashMap<String, String>,
    translations: HashMap<String, String>,
    nested: HashMap<String, Serializer>,
    order_by: Option<String>,
}

impl Serializer {
    /// Creates a serializer emitting `fields`, in order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Uses `label` as the output key of `field`.
    pub fn label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    /// Reads output field `field` from the record field `model_field`.
    pub fn translate(mut self, field: impl Into<String>, model_field: impl Into<String>) -> Self {
        self.translations.insert(field.into(), model_field.into());
        self
    }

    /// Renders the collection field `field` with `serializer`. Collections
    /// without a nested serializer render as `null`.
    pub fn nested(mut self, field: impl Into<String>, serializer: Serializer) -> Self {
        self.nested.insert(field.into(), serializer);
        self
    }

    /// Sorts [`to_values`](Self::to_values) output by an output key;
    /// a leading `-` sorts descending.
    pub fn order_by(mut self, key: impl Into<String>) -> Self {
        self.order_by = Some(key.into());
        self
    }

    pub fn to_value(&self, record: &Record) -> Result<Value, ModelError> {
        let mut output = Map::new();

        for field in &self.fields {
            let model_field = self
                .translations
                .get(field)
                .map(String::as_str)
                .unwrap_or(field);
            let value = record
                .get(model_field)
                .ok_or_else(|| ModelError::UnknownField {
                    schema: record.schema().name,
                    field: model_field.to_string(),
                })?;

            let json = match value {
                FieldValue::String(s) => s.clone().map(Value::String).unwrap_or(Value::Null),
                FieldValue::Number(n) => n.map(Value::from).unwrap_or(Value::Null),
                FieldValue::Collection(records) => match self.nested.get(model_field) {
                    Some(nested) => nested.to_values(records)?,
                    None => Value::Null,
                },
            };

            let key = self
                .labels
                .get(field)
                .cloned()
                .unwrap_or_else(|| lower_camel_case(field));
            output.insert(key, json);
        }

        Ok(Value::Object(output))
    }

    pub fn to_values(&self, records: &[Record]) -> Result<Value, ModelError> {
        let mut values = records
            .iter()
            .map(|r| self.to_value(r))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(order_by) = &self.order_by {
            let (key, descending) = match order_by.strip_prefix('-') {
                Some(key) => (key, true),
                None => (order_by.as_str(), false),
            };
            values.sort_by(|a, b| {
                let ordering = compare(a.get(key), b.get(key));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        Ok(Value::Array(values))
    }

    pub fn to_json_string(&self, record: &Record) -> Result<String, ModelError> {
        Ok(self.to_value(record)?.to_string())
    }
}

/// `rec_cre_usr` becomes `recCreUsr`. Empty segments keep their underscore.
pub fn lower_camel_case(name: &str) -> String {
    let pascal: String = name
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => "_".to_string(),
            }
        })
        .collect();

    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// Missing and null sort first, then booleans, numbers and strings.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
