use async_trait::async_trait;

use super::{Item, PageRequest, RawPage, Result, WriteResponse};

/// A lazy sequence of store pages.
///
/// Each call performs at most one store round trip. After `None` or an error
/// the source is exhausted.
#[async_trait]
pub trait PageSource<T: Send + 'static = Item>: Send {
    /// Fetches the next page, or `None` once the store has no more data.
    async fn next_page(&mut self) -> Option<Result<RawPage<T>>>;
}

/// The store collaborator: single-item round trips plus paginated reads.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetches one item by its full key. `Ok(None)` when it does not exist.
    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>>;

    /// Writes one item, replacing any item with the same key.
    async fn put_item(&self, table: &str, item: &Item) -> Result<WriteResponse>;

    /// Applies an update expression to the item with the given key.
    async fn update_item(
        &self,
        table: &str,
        key: &Item,
        expression: &str,
        values: &Item,
    ) -> Result<WriteResponse>;

    /// Starts a paginated query or scan. No request is sent until the first
    /// page is pulled.
    fn paginate(&self, request: PageRequest) -> Box<dyn PageSource<Item> + '_>;
}
