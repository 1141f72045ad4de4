//! Crawler module for walking archive collections
//!
//! This module contains the core crawling logic, including:
//! - The `ArchiveApi` seam between the crawl loop and the remote archive
//! - HTTP access to the archive's search and metadata endpoints
//! - The resumable crawl loop driving the work ledger and hash recorder

mod archive;
mod coordinator;
mod fetcher;

pub use archive::{ArchiveApi, ArchiveError, ItemKind};
pub use coordinator::{run_crawl, Coordinator, CrawlSummary, StepOutcome};
pub use fetcher::{build_http_client, HttpArchive};
