use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::{Item, Result, SourceError};

/// One physical page as returned by the store.
///
/// `count` is the store-reported number of items, which for filtered reads
/// may be smaller than the number of items the store examined.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage<T = Item> {
    pub items: Vec<T>,
    pub count: usize,
    pub continuation: Option<T>,
}

impl<T> RawPage<T> {
    /// Creates a page whose count matches its items.
    pub fn new(items: Vec<T>, continuation: Option<T>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            continuation,
        }
    }

    /// Whether the store reported more data after this page.
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Items collected for one caller-facing call, plus the key to resume from.
///
/// `last_evaluated_key` is present if and only if another call with the same
/// parameters can return more data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultEnvelope<T = Item> {
    pub items: Vec<T>,
    pub last_evaluated_key: Option<T>,
}

impl<T> ResultEnvelope<T> {
    pub fn new(items: Vec<T>, last_evaluated_key: Option<T>) -> Self {
        Self {
            items,
            last_evaluated_key,
        }
    }

    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<T>) {
        (self.items, self.last_evaluated_key)
    }
}

/// Which paginated read a [`PageRequest`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Query,
    Scan,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::Query => write!(f, "query"),
            PageKind::Scan => write!(f, "scan"),
        }
    }
}

/// Parameters handed to [`StoreClient::paginate`](super::StoreClient::paginate).
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub kind: PageKind,
    pub table: String,
    pub key_condition: Option<String>,
    pub filter: Option<String>,
    pub values: Option<Item>,
    pub attribute_names: Option<HashMap<String, String>>,
    pub index_name: Option<String>,
    pub start_key: Option<Item>,
    /// Per-request item limit forwarded to the store.
    pub page_size: Option<u32>,
}

/// Parameters of a full-drain query.
///
/// The key condition and its values are optional here so that their absence
/// can be reported as a configuration error instead of a type error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub key_condition: Option<String>,
    pub key_condition_values: Option<Item>,
    pub filter: Option<String>,
    pub attribute_names: Option<HashMap<String, String>>,
    pub index_name: Option<String>,
    pub start_key: Option<Item>,
    pub page_size: Option<u32>,
}

impl QueryParams {
    pub fn new(key_condition: impl Into<String>, key_condition_values: Item) -> Self {
        Self {
            key_condition: Some(key_condition.into()),
            key_condition_values: Some(key_condition_values),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn attribute_names(mut self, names: HashMap<String, String>) -> Self {
        self.attribute_names = Some(names);
        self
    }

    pub fn index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn start_key(mut self, start_key: Item) -> Self {
        self.start_key = Some(start_key);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Validates the parameters and builds the store request.
    pub fn into_request(self, table: &str) -> Result<PageRequest> {
        let (Some(key_condition), Some(values)) = (self.key_condition, self.key_condition_values)
        else {
            return Err(SourceError::Configuration(
                "KeyConditionExpression is missing".to_string(),
            ));
        };

        Ok(PageRequest {
            kind: PageKind::Query,
            table: table.to_string(),
            key_condition: Some(key_condition),
            filter: self.filter,
            values: Some(values),
            attribute_names: self.attribute_names,
            index_name: self.index_name,
            start_key: self.start_key,
            page_size: self.page_size,
        })
    }
}

/// Parameters of a scan. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanParams {
    pub filter: Option<String>,
    pub filter_values: Option<Item>,
    pub attribute_names: Option<HashMap<String, String>>,
    pub index_name: Option<String>,
    pub start_key: Option<Item>,
}

impl ScanParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>, values: Item) -> Self {
        self.filter = Some(filter.into());
        self.filter_values = Some(values);
        self
    }

    pub fn attribute_names(mut self, names: HashMap<String, String>) -> Self {
        self.attribute_names = Some(names);
        self
    }

    pub fn index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn start_key(mut self, start_key: Item) -> Self {
        self.start_key = Some(start_key);
        self
    }

    /// Builds the store request. Filter values are only sent with a filter.
    pub fn into_request(self, table: &str, page_size: Option<u32>) -> PageRequest {
        let values = self.filter.as_ref().and(self.filter_values);

        PageRequest {
            kind: PageKind::Scan,
            table: table.to_string(),
            key_condition: None,
            filter: self.filter,
            values,
            attribute_names: self.attribute_names,
            index_name: self.index_name,
            start_key: self.start_key,
            page_size,
        }
    }
}

/// Outcome of a single write round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub status: u16,
    /// Human-readable rendering of the store's response.
    pub payload: String,
}

impl WriteResponse {
    pub const OK: u16 = 200;

    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: Self::OK,
            payload: payload.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::OK
    }
}
