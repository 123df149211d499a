//! Store-facing types and the collaborator traits.

mod error;
mod pages;
mod traits;
mod types;
mod value;

pub use error::{Result, SourceError};
pub use pages::StaticPages;
pub use traits::{PageSource, StoreClient};
pub use types::{
    PageKind, PageRequest, QueryParams, RawPage, ResultEnvelope, ScanParams, WriteResponse,
};
pub use value::{item_from_json, item_to_json, AttributeValue, Item};
