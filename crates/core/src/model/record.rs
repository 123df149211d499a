use crate::source::{AttributeValue, Item};

use super::{Codec, Field, ModelError, Schema};

/// The value held by one field of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(Option<String>),
    Number(Option<i64>),
    Collection(Vec<Record>),
}

impl FieldValue {
    fn empty(codec: &Codec) -> Self {
        match codec {
            Codec::String => FieldValue::String(None),
            Codec::Number => FieldValue::Number(None),
            Codec::Collection(_) => FieldValue::Collection(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::String(value) => value.is_none(),
            FieldValue::Number(value) => value.is_none(),
            FieldValue::Collection(records) => records.is_empty(),
        }
    }
}

/// The values of one item under a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static Schema,
    values: Vec<FieldValue>,
}

impl Record {
    /// Creates an empty record, validating the schema first.
    pub fn new(schema: &'static Schema) -> Result<Self, ModelError> {
        schema.validate()?;
        Ok(Self::empty(schema))
    }

    /// Creates a record filled from a store item.
    pub fn from_item(schema: &'static Schema, item: &Item) -> Result<Self, ModelError> {
        let mut record = Self::new(schema)?;
        record.fill(item)?;
        Ok(record)
    }

    fn empty(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: schema
                .fields
                .iter()
                .map(|f| FieldValue::empty(&f.codec))
                .collect(),
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Copies every attribute that maps to a declared field; other
    /// attributes are ignored.
    pub fn fill(&mut self, item: &Item) -> Result<(), ModelError> {
        for (wire_name, value) in item {
            let Some((index, field)) = self.schema.field_by_wire_name(wire_name) else {
                continue;
            };
            self.values[index] = decode(field, value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .field(name)
            .map(|(index, _)| &self.values[index])
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::String(value)) => value.as_deref(),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(FieldValue::Number(value)) => *value,
            _ => None,
        }
    }

    pub fn collection(&self, name: &str) -> &[Record] {
        match self.get(name) {
            Some(FieldValue::Collection(records)) => records,
            _ => &[],
        }
    }

    /// Replaces a field's value. The value must match the field's codec.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), ModelError> {
        let (index, field) = self.lookup(name)?;

        let compatible = match (&field.codec, &value) {
            (Codec::String, FieldValue::String(_)) => true,
            (Codec::Number, FieldValue::Number(_)) => true,
            (Codec::Collection(schema), FieldValue::Collection(records)) => {
                records.iter().all(|r| std::ptr::eq(r.schema, *schema))
            }
            _ => false,
        };
        if !compatible {
            return Err(ModelError::CodecMismatch {
                field: name.to_string(),
                expected: field.codec.name(),
            });
        }

        self.values[index] = match value {
            FieldValue::String(Some(s)) if s.is_empty() => FieldValue::String(None),
            other => other,
        };
        Ok(())
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> Result<(), ModelError> {
        self.set(name, FieldValue::String(Some(value.into())))
    }

    pub fn set_number(&mut self, name: &str, value: i64) -> Result<(), ModelError> {
        self.set(name, FieldValue::Number(Some(value)))
    }

    /// Appends a nested record to a collection field.
    pub fn push(&mut self, name: &str, record: Record) -> Result<(), ModelError> {
        let (index, field) = self.lookup(name)?;
        match (&field.codec, &mut self.values[index]) {
            (Codec::Collection(schema), FieldValue::Collection(records))
                if std::ptr::eq(record.schema, *schema) =>
            {
                records.push(record);
                Ok(())
            }
            _ => Err(ModelError::CodecMismatch {
                field: name.to_string(),
                expected: field.codec.name(),
            }),
        }
    }

    /// Renders the record as a store item.
    ///
    /// With `include_nulls`, absent scalars are written as `NULL` and empty
    /// collections as empty lists; otherwise both are left out.
    pub fn to_item(&self, include_nulls: bool) -> Item {
        let mut item = Item::new();

        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            if value.is_empty() && !include_nulls {
                continue;
            }
            let attribute = match value {
                FieldValue::String(Some(s)) => AttributeValue::S(s.clone()),
                FieldValue::Number(Some(n)) => AttributeValue::N(n.to_string()),
                FieldValue::String(None) | FieldValue::Number(None) => AttributeValue::Null(true),
                FieldValue::Collection(records) => AttributeValue::L(
                    records
                        .iter()
                        .map(|r| AttributeValue::M(r.to_item(include_nulls)))
                        .collect(),
                ),
            };
            item.insert(field.wire_name.to_string(), attribute);
        }

        item
    }

    fn lookup(&self, name: &str) -> Result<(usize, &'static Field), ModelError> {
        self.schema
            .field(name)
            .ok_or_else(|| ModelError::UnknownField {
                schema: self.schema.name,
                field: name.to_string(),
            })
    }
}

/// Maps store items to records, validating the schema once.
pub fn records_from_items(
    schema: &'static Schema,
    items: &[Item],
) -> Result<Vec<Record>, ModelError> {
    schema.validate()?;
    items
        .iter()
        .map(|item| {
            let mut record = Record::empty(schema);
            record.fill(item)?;
            Ok(record)
        })
        .collect()
}

fn decode(field: &Field, value: &AttributeValue) -> Result<FieldValue, ModelError> {
    match field.codec {
        Codec::String => decode_string(field, value).map(FieldValue::String),
        Codec::Number => decode_number(field, value).map(FieldValue::Number),
        Codec::Collection(schema) => {
            decode_collection(field, schema, value).map(FieldValue::Collection)
        }
    }
}

fn decode_string(field: &Field, value: &AttributeValue) -> Result<Option<String>, ModelError> {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) if s.is_empty() => Ok(None),
        AttributeValue::S(s) | AttributeValue::N(s) => Ok(Some(s.clone())),
        AttributeValue::Bool(b) => Ok(Some(b.to_string())),
        AttributeValue::Null(_) => Ok(None),
        _ => Err(mismatch(field)),
    }
}

fn decode_number(field: &Field, value: &AttributeValue) -> Result<Option<i64>, ModelError> {
    let raw = match value {
        AttributeValue::N(n) | AttributeValue::S(n) => n.trim(),
        AttributeValue::Null(_) => return Ok(None),
        _ => return Err(mismatch(field)),
    };
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Some(n));
    }

    // Fractional values are truncated toward zero.
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.trunc() as i64)),
        _ => Err(ModelError::InvalidValue {
            field: field.name.to_string(),
            reason: format!("{raw} is not an integer"),
        }),
    }
}

fn decode_collection(
    field: &Field,
    schema: &'static Schema,
    value: &AttributeValue,
) -> Result<Vec<Record>, ModelError> {
    match value {
        AttributeValue::L(values) => values
            .iter()
            .map(|v| match v {
                AttributeValue::M(map) => {
                    let mut record = Record::empty(schema);
                    record.fill(map)?;
                    Ok(record)
                }
                _ => Err(mismatch(field)),
            })
            .collect(),
        AttributeValue::Null(_) => Ok(Vec::new()),
        _ => Err(mismatch(field)),
    }
}

fn mismatch(field: &Field) -> ModelError {
    ModelError::CodecMismatch {
        field: field.name.to_string(),
        expected: field.codec.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::item_from_json;
    use serde_json::json;

    static LINE: Schema = Schema {
        name: "Line",
        table: None,
        fields: &[Field::string("sku"), Field::number("qty")],
    };

    static INVOICE: Schema = Schema {
        name: "Invoice",
        table: Some("traffic"),
        fields: &[
            Field::string("uuid"),
            Field::string("created_by").wire("rec_cre_usr"),
            Field::number("total"),
            Field::collection("lines", &LINE),
        ],
    };

    fn invoice_item() -> Item {
        item_from_json(&json!({
            "uuid": "e7362c92-5175-11ec-8aa2-b630403e3bed",
            "rec_cre_usr": "jorge.gomez",
            "total": 120,
            "record_type": "invoice",
            "lines": [
                {"sku": "A-1", "qty": 2},
                {"sku": "B-7", "qty": "3.0"},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_fill_from_item() {
        let record = Record::from_item(&INVOICE, &invoice_item()).unwrap();

        assert_eq!(
            record.string("uuid"),
            Some("e7362c92-5175-11ec-8aa2-b630403e3bed")
        );
        assert_eq!(record.string("created_by"), Some("jorge.gomez"));
        assert_eq!(record.number("total"), Some(120));

        let lines = record.collection("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].string("sku"), Some("A-1"));
        assert_eq!(lines[1].number("qty"), Some(3));
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let record = Record::from_item(&INVOICE, &invoice_item()).unwrap();
        assert!(record.get("record_type").is_none());
        assert!(!record.to_item(false).contains_key("record_type"));
    }

    #[test]
    fn test_empty_string_is_absent() {
        let item = item_from_json(&json!({"uuid": "", "total": null})).unwrap();
        let record = Record::from_item(&INVOICE, &item).unwrap();
        assert_eq!(record.string("uuid"), None);
        assert_eq!(record.number("total"), None);
    }

    #[test]
    fn test_invalid_number() {
        let item = item_from_json(&json!({"total": "lots"})).unwrap();
        let err = Record::from_item(&INVOICE, &item).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { ref field, .. } if field == "total"));
    }

    #[test]
    fn test_collection_requires_maps() {
        let item = item_from_json(&json!({"lines": ["A-1"]})).unwrap();
        assert_eq!(
            Record::from_item(&INVOICE, &item).unwrap_err(),
            ModelError::CodecMismatch {
                field: "lines".to_string(),
                expected: "collection"
            }
        );
    }

    #[test]
    fn test_to_item_uses_wire_names() {
        let record = Record::from_item(&INVOICE, &invoice_item()).unwrap();
        let item = record.to_item(false);

        assert_eq!(
            item["rec_cre_usr"],
            AttributeValue::S("jorge.gomez".to_string())
        );
        assert_eq!(item["total"], AttributeValue::N("120".to_string()));
        assert!(!item.contains_key("created_by"));
        match &item["lines"] {
            AttributeValue::L(lines) => assert_eq!(lines.len(), 2),
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_to_item_nulls() {
        let mut record = Record::new(&INVOICE).unwrap();
        record.set_string("uuid", "abc").unwrap();

        let sparse = record.to_item(false);
        assert_eq!(sparse.len(), 1);

        let full = record.to_item(true);
        assert_eq!(full.len(), 4);
        assert!(full["total"].is_null());
        assert_eq!(full["lines"], AttributeValue::L(vec![]));
    }

    #[test]
    fn test_set_checks_codec() {
        let mut record = Record::new(&INVOICE).unwrap();
        assert!(record.set_number("total", 10).is_ok());
        assert_eq!(
            record.set_number("uuid", 10),
            Err(ModelError::CodecMismatch {
                field: "uuid".to_string(),
                expected: "string"
            })
        );
        assert!(matches!(
            record.set_string("missing", "x"),
            Err(ModelError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_push_nested_record() {
        let mut record = Record::new(&INVOICE).unwrap();
        let mut line = Record::new(&LINE).unwrap();
        line.set_string("sku", "C-3").unwrap();

        record.push("lines", line).unwrap();
        assert_eq!(record.collection("lines")[0].string("sku"), Some("C-3"));

        let wrong = Record::new(&INVOICE).unwrap();
        assert!(record.push("lines", wrong).is_err());
    }

    #[test]
    fn test_records_from_items() {
        let records = records_from_items(&INVOICE, &[invoice_item(), Item::new()]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].string("uuid"), None);
    }
}
