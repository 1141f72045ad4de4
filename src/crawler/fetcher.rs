//! HTTP implementation of the archive seam
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - The advanced-search listing endpoint
//! - The per-item metadata endpoints (media type and file list)
//! - Mapping transport, status and decode failures to `ArchiveError`

use crate::config::ArchiveConfig;
use crate::crawler::archive::{ArchiveApi, ArchiveError, ItemKind};
use crate::storage::ItemFile;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "numFound", default)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    identifier: String,
}

#[derive(Debug, Deserialize)]
struct MediatypeResponse {
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    result: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    name: String,
    #[serde(default)]
    sha1: Option<String>,
}

impl From<FileEntry> for ItemFile {
    fn from(entry: FileEntry) -> Self {
        ItemFile::new(entry.name, entry.sha1.unwrap_or_default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// Responses are requested gzip- or brotli-encoded and decoded transparently.
pub fn build_http_client(config: &ArchiveConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Archive client speaking the search and metadata HTTP APIs
#[derive(Debug, Clone)]
pub struct HttpArchive {
    client: Client,
    base_url: Url,
}

impl HttpArchive {
    /// Creates a client for the archive at `config.base_url`
    pub fn new(config: &ArchiveConfig) -> crate::Result<Self> {
        let client = build_http_client(config)?;
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self { client, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ArchiveError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ArchiveError::InvalidRequest(format!("{} cannot be a base URL", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ArchiveError> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ArchiveError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ArchiveError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

impl ArchiveApi for HttpArchive {
    async fn fetch_page(
        &self,
        collection: &str,
        rows: u32,
        page: u32,
    ) -> Result<Vec<String>, ArchiveError> {
        if rows < 1 || page < 1 {
            return Err(ArchiveError::InvalidRequest(format!(
                "rows ({}) and page ({}) must be >= 1",
                rows, page
            )));
        }

        let mut url = self.endpoint(&["advancedsearch.php"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("collection:{}", collection))
            .append_pair("fl[]", "identifier")
            .append_pair("rows", &rows.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("sort", "downloads desc")
            .append_pair("output", "json");

        let search: SearchResponse = self.get_json(url).await?;
        tracing::trace!(
            "{} page {}: {} entries of {}",
            collection,
            page,
            search.response.docs.len(),
            search.response.num_found
        );

        Ok(search
            .response
            .docs
            .into_iter()
            .map(|doc| doc.identifier)
            .collect())
    }

    async fn fetch_kind(&self, item: &str) -> Result<ItemKind, ArchiveError> {
        let url = self.endpoint(&["metadata", item, "metadata", "mediatype"])?;
        let mediatype: MediatypeResponse = self.get_json(url).await?;
        Ok(ItemKind::from_mediatype(mediatype.result.as_deref()))
    }

    async fn fetch_files(&self, item: &str) -> Result<Vec<ItemFile>, ArchiveError> {
        let url = self.endpoint(&["metadata", item, "files"])?;
        let files: FilesResponse = self.get_json(url).await?;
        Ok(files.result.into_iter().map(ItemFile::from).collect())
    }
}
