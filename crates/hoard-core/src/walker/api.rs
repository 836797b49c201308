use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::downloader::{StreamDescriptor, StreamSource};
use crate::retry::FetchError;

use super::model::{Envelope, FolderList, Item, Page};

/// The remote catalog, reduced to what the walker needs.
///
/// Listing calls return the full envelope so the cache can check its status
/// before persisting it.
pub trait CatalogApi: Send + Sync {
    /// Whether the remote still serves this item. An error carries the remote's reason.
    fn check_access(&self, item: &Item) -> Result<()>;
    fn list_folders(&self, owner: &str) -> Result<Envelope<FolderList>>;
    /// Pages are 1-based.
    fn list_page(&self, folder: &str, page: u32) -> Result<Envelope<Page>>;
    /// Direct transfer endpoint for the item's video. Called once per download attempt.
    fn resolve_stream(&self, item: &Item) -> Result<StreamDescriptor, FetchError>;
    fn fetch_comments(&self, item: &Item) -> Result<Value>;
    fn fetch_captions(&self, item: &Item) -> Result<Vec<u8>>;
    fn fetch_cover(&self, item: &Item) -> Result<Vec<u8>>;
}

/// An item's video as a download source.
pub struct ItemStream {
    api: Arc<dyn CatalogApi>,
    item: Item,
}

impl ItemStream {
    pub fn new(api: Arc<dyn CatalogApi>, item: Item) -> Self {
        Self { api, item }
    }
}

impl StreamSource for ItemStream {
    fn label(&self) -> String {
        self.item.label()
    }

    fn resolve(&self) -> Result<StreamDescriptor, FetchError> {
        self.api.resolve_stream(&self.item)
    }
}
