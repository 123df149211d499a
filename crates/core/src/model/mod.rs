//! Static attribute mapping between typed records and store items.
//!
//! A model is declared once as a [`Schema`]: an ordered list of
//! `(name, wire_name, codec)` fields. [`Record`] holds the values of one
//! item under that schema and [`Serializer`] renders records as JSON for
//! API responses.

mod error;
mod record;
mod schema;
mod serializer;

pub use error::ModelError;
pub use record::{records_from_items, FieldValue, Record};
pub use schema::{Codec, Field, Schema};
pub use serializer::{lower_camel_case, Serializer};
