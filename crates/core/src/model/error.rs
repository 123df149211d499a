use thiserror::Error;

/// Errors raised while declaring, filling or rendering records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Schema {schema} declares no fields")]
    EmptySchema { schema: &'static str },
    #[error("Schema {schema} declares field {field} more than once")]
    DuplicateField {
        schema: &'static str,
        field: &'static str,
    },
    #[error("Schema {schema} maps more than one field to attribute {wire_name}")]
    DuplicateWireName {
        schema: &'static str,
        wire_name: &'static str,
    },
    #[error("{field} is not a field of {schema}")]
    UnknownField { schema: &'static str, field: String },
    #[error("Field {field} expects a {expected} value")]
    CodecMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
