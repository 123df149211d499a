//! In-memory store implementation.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynasource_core::source::{
    item_to_json, AttributeValue, Item, PageKind, PageRequest, PageSource, RawPage, Result,
    SourceError, StoreClient, WriteResponse,
};

use super::expression::{ConditionExpression, UpdateExpression};

/// Physical page size used when a request sets no limit.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Declaration of one in-memory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub key_attributes: Vec<String>,
    /// Items examined per page when the request sets no limit.
    pub page_size: usize,
    /// Status reported for writes. Anything but 200 rejects the write.
    pub write_status: u16,
}

impl TableSpec {
    pub fn new(
        name: impl Into<String>,
        key_attributes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            key_attributes: key_attributes.into_iter().map(Into::into).collect(),
            page_size: DEFAULT_PAGE_SIZE,
            write_status: WriteResponse::OK,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_write_status(mut self, status: u16) -> Self {
        self.write_status = status;
        self
    }
}

/// Key attribute values in table order. Numbers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Number(i64),
    Text(String),
}

type Key = Vec<KeyPart>;

#[derive(Debug)]
struct Table {
    spec: TableSpec,
    items: BTreeMap<Key, Item>,
}

impl Table {
    fn key_of(&self, item: &Item) -> Result<Key> {
        self.spec
            .key_attributes
            .iter()
            .map(|name| match item.get(name) {
                Some(AttributeValue::S(s)) => Ok(KeyPart::Text(s.clone())),
                Some(AttributeValue::N(n)) => n.parse().map(KeyPart::Number).map_err(|_| {
                    SourceError::InvalidData(format!("Key attribute '{name}' is not an integer"))
                }),
                Some(_) => Err(SourceError::InvalidData(format!(
                    "Key attribute '{name}' must be a string or a number"
                ))),
                None => Err(SourceError::InvalidData(format!(
                    "Missing key attribute '{name}' for table {}",
                    self.spec.name
                ))),
            })
            .collect()
    }

    fn key_item(&self, item: &Item) -> Item {
        item.iter()
            .filter(|(name, _)| self.spec.key_attributes.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// In-memory storage backend for testing.
///
/// Tables live in a `HashMap` wrapped in `Arc<RwLock<_>>`; items are kept in
/// key order so scans are stable and resumable. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    requests: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates a store with the given empty tables.
    pub fn new(tables: impl IntoIterator<Item = TableSpec>) -> Self {
        let tables = tables
            .into_iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    Table {
                        spec,
                        items: BTreeMap::new(),
                    },
                )
            })
            .collect();

        Self {
            tables: Arc::new(RwLock::new(tables)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stores an item directly, without counting a request.
    pub async fn insert(&self, table: &str, item: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;
        let key = table.key_of(&item)?;
        table.items.insert(key, item);
        Ok(())
    }

    /// Number of items in `table`.
    pub async fn item_count(&self, table: &str) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(table_ref(&tables, table)?.items.len())
    }

    /// Store round trips served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    async fn read_page(&self, request: &PageRequest, after: Option<&Key>) -> Result<Page> {
        let tables = self.tables.read().await;
        let table = table_ref(&tables, &request.table)?;

        let key_condition = match (request.kind, &request.key_condition) {
            (PageKind::Query, Some(expression)) => Some(ConditionExpression::parse(
                expression,
                request.attribute_names.as_ref(),
            )?),
            (PageKind::Query, None) => {
                return Err(SourceError::transport(
                    "Query requires a KeyConditionExpression",
                ))
            }
            (PageKind::Scan, _) => None,
        };
        let filter = request
            .filter
            .as_deref()
            .map(|expression| {
                ConditionExpression::parse(expression, request.attribute_names.as_ref())
            })
            .transpose()?;

        let lower = match after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        let page_size = request
            .page_size
            .map(|n| n as usize)
            .unwrap_or(table.spec.page_size)
            .max(1);

        let mut examined = table.items.range((lower, Bound::Unbounded));
        let mut items = Vec::new();
        let mut last_key = None;
        let mut scanned = 0;

        for (key, item) in examined.by_ref() {
            if let Some(condition) = &key_condition {
                // Items outside the key condition are not part of the query.
                if !condition.matches(item, request.values.as_ref())? {
                    continue;
                }
            }

            scanned += 1;
            last_key = Some((key.clone(), table.key_item(item)));
            if filter
                .as_ref()
                .map(|f| f.matches(item, request.values.as_ref()))
                .transpose()?
                .unwrap_or(true)
            {
                items.push(item.clone());
            }

            if scanned == page_size {
                break;
            }
        }

        let more = match &key_condition {
            Some(condition) => {
                let mut more = false;
                for (_, item) in examined {
                    if condition.matches(item, request.values.as_ref())? {
                        more = true;
                        break;
                    }
                }
                more
            }
            None => examined.next().is_some(),
        };

        Ok(Page {
            items,
            continuation: if more { last_key } else { None },
        })
    }
}

struct Page {
    items: Vec<Item>,
    continuation: Option<(Key, Item)>,
}

fn table_ref<'a>(tables: &'a HashMap<String, Table>, name: &str) -> Result<&'a Table> {
    tables
        .get(name)
        .ok_or_else(|| SourceError::transport(format!("Table not found: {name}")))
}

fn table_mut<'a>(tables: &'a mut HashMap<String, Table>, name: &str) -> Result<&'a mut Table> {
    tables
        .get_mut(name)
        .ok_or_else(|| SourceError::transport(format!("Table not found: {name}")))
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>> {
        self.record_request();
        let tables = self.tables.read().await;
        let table = table_ref(&tables, table)?;
        let key = table.key_of(key)?;
        Ok(table.items.get(&key).cloned())
    }

    async fn put_item(&self, table: &str, item: &Item) -> Result<WriteResponse> {
        self.record_request();
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;

        if table.spec.write_status != WriteResponse::OK {
            return Ok(rejected(table.spec.write_status));
        }

        let key = table.key_of(item)?;
        table.items.insert(key, item.clone());
        Ok(WriteResponse::ok("{}"))
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Item,
        expression: &str,
        values: &Item,
    ) -> Result<WriteResponse> {
        self.record_request();
        let update = UpdateExpression::parse(expression, None)?;

        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, table)?;

        if table.spec.write_status != WriteResponse::OK {
            return Ok(rejected(table.spec.write_status));
        }

        if let Some(path) = update
            .paths()
            .find(|path| table.spec.key_attributes.iter().any(|name| name == path))
        {
            return Err(SourceError::transport(format!(
                "Cannot update attribute {path}. This attribute is part of the key"
            )));
        }

        let item_key = table.key_of(key)?;
        let mut item = table
            .items
            .get(&item_key)
            .cloned()
            .unwrap_or_else(|| table.key_item(key));
        let updated = update.apply(&mut item, values)?;
        table.items.insert(item_key, item);

        Ok(WriteResponse::ok(
            serde_json::json!({ "Attributes": item_to_json(&updated) }).to_string(),
        ))
    }

    fn paginate(&self, request: PageRequest) -> Box<dyn PageSource<Item> + '_> {
        Box::new(InMemoryPages {
            store: self,
            request,
            after: None,
            started: false,
            exhausted: false,
        })
    }
}

fn rejected(status: u16) -> WriteResponse {
    WriteResponse {
        status,
        payload: format!("{{\"ResponseMetadata\":{{\"HTTPStatusCode\":{status}}}}}"),
    }
}

/// Pages through one table in key order. Each page takes the read lock once.
struct InMemoryPages<'a> {
    store: &'a InMemoryStore,
    request: PageRequest,
    after: Option<Key>,
    started: bool,
    exhausted: bool,
}

impl InMemoryPages<'_> {
    async fn resolve_start(&mut self) -> Result<()> {
        self.started = true;
        if let Some(start_key) = &self.request.start_key {
            let tables = self.store.tables.read().await;
            let table = table_ref(&tables, &self.request.table)?;
            self.after = Some(table.key_of(start_key)?);
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> PageSource<Item> for InMemoryPages<'a> {
    async fn next_page(&mut self) -> Option<Result<RawPage>> {
        if self.exhausted {
            return None;
        }
        self.store.record_request();

        if !self.started {
            if let Err(e) = self.resolve_start().await {
                self.exhausted = true;
                return Some(Err(e));
            }
        }

        match self.store.read_page(&self.request, self.after.as_ref()).await {
            Ok(page) => {
                let continuation = page.continuation.map(|(key, item)| {
                    self.after = Some(key);
                    item
                });
                self.exhausted = continuation.is_none();
                Some(Ok(RawPage::new(page.items, continuation)))
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynasource_core::source::item_from_json;
    use serde_json::json;

    fn item(value: serde_json::Value) -> Item {
        item_from_json(&value).unwrap()
    }

    async fn store(count: i64, spec: TableSpec) -> InMemoryStore {
        let store = InMemoryStore::new([spec]);
        for i in 1..=count {
            let status = if i % 2 == 0 { "even" } else { "odd" };
            store
                .insert("traffic", item(json!({"uuid": i, "status": status})))
                .await
                .unwrap();
        }
        store
    }

    async fn collect(pages: &mut (dyn PageSource<Item> + '_)) -> Vec<RawPage> {
        let mut collected = Vec::new();
        while let Some(page) = pages.next_page().await {
            collected.push(page.unwrap());
        }
        collected
    }

    fn scan(filter: Option<&str>, start_key: Option<Item>, page_size: Option<u32>) -> PageRequest {
        PageRequest {
            kind: PageKind::Scan,
            table: "traffic".to_string(),
            key_condition: None,
            filter: filter.map(str::to_string),
            values: Some(item(json!({":s": "even"}))),
            attribute_names: None,
            index_name: None,
            start_key,
            page_size,
        }
    }

    #[tokio::test]
    async fn test_scan_pages_in_key_order() {
        let store = store(7, TableSpec::new("traffic", ["uuid"]).with_page_size(3)).await;

        let mut pages = store.paginate(scan(None, None, None));
        let pages = collect(&mut *pages).await;

        let sizes: Vec<usize> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(
            pages[0].continuation,
            Some(item(json!({"uuid": 3})))
        );
        assert!(pages[2].continuation.is_none());
        assert_eq!(store.requests(), 3);
    }

    #[tokio::test]
    async fn test_filter_shrinks_pages() {
        let store = store(6, TableSpec::new("traffic", ["uuid"])).await;

        let mut pages = store.paginate(scan(Some("status = :s"), None, Some(4)));
        let pages = collect(&mut *pages).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].items.len(), 2);
        assert_eq!(pages[0].count, 2);
        assert_eq!(pages[1].items.len(), 1);
    }

    #[tokio::test]
    async fn test_start_key_resumes_after_item() {
        let store = store(5, TableSpec::new("traffic", ["uuid"])).await;

        // Full items work as start keys; only key attributes are used.
        let start = item(json!({"uuid": 2, "status": "even"}));
        let mut pages = store.paginate(scan(None, Some(start), None));
        let pages = collect(&mut *pages).await;

        let ids: Vec<AttributeValue> = pages[0].items.iter().map(|i| i["uuid"].clone()).collect();
        assert_eq!(
            ids,
            vec![
                AttributeValue::N("3".to_string()),
                AttributeValue::N("4".to_string()),
                AttributeValue::N("5".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_uses_key_condition() {
        let store = InMemoryStore::new([TableSpec::new("orders", ["pk", "sk"]).with_page_size(2)]);
        for (pk, sk) in [("a", 1), ("a", 2), ("a", 3), ("b", 1)] {
            store
                .insert("orders", item(json!({"pk": pk, "sk": sk})))
                .await
                .unwrap();
        }

        let request = PageRequest {
            kind: PageKind::Query,
            table: "orders".to_string(),
            key_condition: Some("#pk = :pk".to_string()),
            filter: None,
            values: Some(item(json!({":pk": "a"}))),
            attribute_names: Some(HashMap::from([("#pk".to_string(), "pk".to_string())])),
            index_name: None,
            start_key: None,
            page_size: None,
        };
        let mut pages = store.paginate(request);
        let pages = collect(&mut *pages).await;

        let sizes: Vec<usize> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = InMemoryStore::new([]);
        let err = store
            .get_item("traffic", &item(json!({"uuid": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_rejected_write_is_not_stored() {
        let store =
            InMemoryStore::new([TableSpec::new("traffic", ["uuid"]).with_write_status(500)]);

        let response = store
            .put_item("traffic", &item(json!({"uuid": "a"})))
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert!(response.payload.contains("500"));
        assert_eq!(store.item_count("traffic").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_returns_updated_attributes() {
        let store = InMemoryStore::new([TableSpec::new("traffic", ["uuid"])]);

        let response = store
            .update_item(
                "traffic",
                &item(json!({"uuid": "a"})),
                "SET status = :s",
                &item(json!({":s": "done"})),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        let payload: serde_json::Value = serde_json::from_str(&response.payload).unwrap();
        assert_eq!(payload, json!({"Attributes": {"status": "done"}}));
        assert_eq!(store.item_count("traffic").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_stores_nothing() {
        let store = store(1, TableSpec::new("traffic", ["uuid"])).await;

        let err = store
            .update_item(
                "traffic",
                &item(json!({"uuid": "ghost"})),
                "SET a = :a, b = :missing",
                &item(json!({":a": "x"})),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains(":missing"));

        let err = store
            .update_item(
                "traffic",
                &item(json!({"uuid": 1})),
                "SET status = :s, b = :missing",
                &item(json!({":s": "changed"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Transport { .. }));

        let ghost = store
            .get_item("traffic", &item(json!({"uuid": "ghost"})))
            .await
            .unwrap();
        assert_eq!(ghost, None);
        assert_eq!(
            store.get_item("traffic", &item(json!({"uuid": 1}))).await.unwrap(),
            Some(item(json!({"uuid": 1, "status": "odd"})))
        );
        assert_eq!(store.item_count("traffic").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_key_attributes() {
        let store = store(1, TableSpec::new("traffic", ["uuid"])).await;

        let err = store
            .update_item(
                "traffic",
                &item(json!({"uuid": 1})),
                "SET uuid = :u",
                &item(json!({":u": 2})),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("part of the key"));
        assert_eq!(
            store.get_item("traffic", &item(json!({"uuid": 1}))).await.unwrap(),
            Some(item(json!({"uuid": 1, "status": "odd"})))
        );
    }
}
