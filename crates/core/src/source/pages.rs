use std::collections::VecDeque;

use async_trait::async_trait;

use super::{Item, PageSource, RawPage, Result};

/// A page source over pages that are already in memory.
#[derive(Debug, Clone)]
pub struct StaticPages<T = Item> {
    pages: VecDeque<Result<RawPage<T>>>,
}

impl<T> StaticPages<T> {
    pub fn new(pages: impl IntoIterator<Item = RawPage<T>>) -> Self {
        Self::from_results(pages.into_iter().map(Ok))
    }

    /// Builds a source that may yield errors at specific positions.
    pub fn from_results(pages: impl IntoIterator<Item = Result<RawPage<T>>>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
        }
    }

    /// Pages not yet pulled.
    pub fn remaining(&self) -> usize {
        self.pages.len()
    }
}

#[async_trait]
impl<T: Send + 'static> PageSource<T> for StaticPages<T> {
    async fn next_page(&mut self) -> Option<Result<RawPage<T>>> {
        self.pages.pop_front()
    }
}
