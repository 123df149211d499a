use std::collections::HashSet;

use super::ModelError;

/// How a field's value is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    String,
    Number,
    /// A list of nested records, each stored as a map.
    Collection(&'static Schema),
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::String => "string",
            Codec::Number => "number",
            Codec::Collection(_) => "collection",
        }
    }
}

/// One declared field of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name used by code and serializers.
    pub name: &'static str,
    /// Attribute name in the store.
    pub wire_name: &'static str,
    pub codec: Codec,
}

impl Field {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            codec: Codec::String,
        }
    }

    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            codec: Codec::Number,
        }
    }

    pub const fn collection(name: &'static str, schema: &'static Schema) -> Self {
        Self {
            name,
            wire_name: name,
            codec: Codec::Collection(schema),
        }
    }

    /// Stores the field under a different attribute name.
    pub const fn wire(self, wire_name: &'static str) -> Self {
        Self { wire_name, ..self }
    }
}

/// A statically declared model.
///
/// ```
/// use dynasource_core::model::{Field, Schema};
///
/// static TRAFFIC: Schema = Schema {
///     name: "Traffic",
///     table: Some("traffic"),
///     fields: &[
///         Field::string("uuid"),
///         Field::string("created_by").wire("rec_cre_usr"),
///         Field::number("total"),
///     ],
/// };
///
/// assert!(TRAFFIC.validate().is_ok());
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    /// Table holding items of this model; `None` for nested models.
    pub table: Option<&'static str>,
    pub fields: &'static [Field],
}

impl Schema {
    /// Checks that the declaration is usable, including nested schemas.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.fields.is_empty() {
            return Err(ModelError::EmptySchema { schema: self.name });
        }

        let mut names = HashSet::new();
        let mut wire_names = HashSet::new();
        for field in self.fields {
            if !names.insert(field.name) {
                return Err(ModelError::DuplicateField {
                    schema: self.name,
                    field: field.name,
                });
            }
            if !wire_names.insert(field.wire_name) {
                return Err(ModelError::DuplicateWireName {
                    schema: self.name,
                    wire_name: field.wire_name,
                });
            }
            if let Codec::Collection(nested) = field.codec {
                nested.validate()?;
            }
        }

        Ok(())
    }

    /// Position and declaration of the field called `name`.
    pub fn field(&self, name: &str) -> Option<(usize, &'static Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Position and declaration of the field stored as `wire_name`.
    pub fn field_by_wire_name(&self, wire_name: &str) -> Option<(usize, &'static Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.wire_name == wire_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
            Field::collection("lines", &LINE),
        ],
    };

    static EMPTY: Schema = Schema {
        name: "Empty",
        table: None,
        fields: &[],
    };

    static DUPLICATE_WIRE: Schema = Schema {
        name: "Broken",
        table: None,
        fields: &[Field::string("a").wire("x"), Field::string("b").wire("x")],
    };

    static BROKEN_NESTED: Schema = Schema {
        name: "Outer",
        table: None,
        fields: &[Field::collection("inner", &EMPTY)],
    };

    #[test]
    fn test_valid_schema() {
        assert!(INVOICE.validate().is_ok());
    }

    #[test]
    fn test_field_lookup() {
        let (index, field) = INVOICE.field("created_by").unwrap();
        assert_eq!(index, 1);
        assert_eq!(field.wire_name, "rec_cre_usr");

        let (index, _) = INVOICE.field_by_wire_name("rec_cre_usr").unwrap();
        assert_eq!(index, 1);
        assert!(INVOICE.field("rec_cre_usr").is_none());
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert_eq!(
            EMPTY.validate(),
            Err(ModelError::EmptySchema { schema: "Empty" })
        );
    }

    #[test]
    fn test_duplicate_wire_name_rejected() {
        assert_eq!(
            DUPLICATE_WIRE.validate(),
            Err(ModelError::DuplicateWireName {
                schema: "Broken",
                wire_name: "x"
            })
        );
    }

    #[test]
    fn test_nested_schema_validated() {
        assert!(matches!(
            BROKEN_NESTED.validate(),
            Err(ModelError::EmptySchema { schema: "Empty" })
        ));
    }
}
