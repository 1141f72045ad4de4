//! The remote archive as seen by the crawl loop
//!
//! The coordinator only needs three questions answered: which entries are on
//! a page of a collection's listing, whether an entry is itself a collection,
//! and which files (with hashes) a leaf item holds. `ArchiveApi` is that seam;
//! `HttpArchive` answers it over HTTP and tests answer it from a script.

use crate::storage::ItemFile;
use thiserror::Error;

/// Errors talking to the remote archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode { url: String, source: reqwest::Error },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Whether an archive entry groups other entries or holds files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Collection,
    Item,
}

impl ItemKind {
    /// Classifies an entry from its reported media type
    pub fn from_mediatype(mediatype: Option<&str>) -> Self {
        match mediatype {
            Some("collection") => Self::Collection,
            _ => Self::Item,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection)
    }
}

/// Listing and metadata lookups the crawl loop depends on
#[allow(async_fn_in_trait)]
pub trait ArchiveApi {
    /// Fetches one page of a collection's listing
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection name
    /// * `rows` - Entries per page
    /// * `page` - Page number, starting at 1
    ///
    /// # Returns
    ///
    /// Entry names in listing order; empty once the listing is exhausted
    async fn fetch_page(
        &self,
        collection: &str,
        rows: u32,
        page: u32,
    ) -> Result<Vec<String>, ArchiveError>;

    /// Determines whether an entry is a collection
    async fn fetch_kind(&self, item: &str) -> Result<ItemKind, ArchiveError>;

    /// Lists a leaf item's files with their SHA-1 hashes
    async fn fetch_files(&self, item: &str) -> Result<Vec<ItemFile>, ArchiveError>;
}
