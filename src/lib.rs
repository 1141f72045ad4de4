//! Archive-Hasher: a resumable content-hash harvester for nested archive collections
//!
//! This crate walks a remote archive organized as nested named collections,
//! queues every collection it discovers in a durable work ledger, and records
//! the SHA-1 digests of every leaf item's files for later deduplication.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Archive-Hasher operations
#[derive(Debug, Error)]
pub enum HasherError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Archive error: {0}")]
    Archive(#[from] crawler::ArchiveError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Archive-Hasher operations
pub type Result<T> = std::result::Result<T, HasherError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ArchiveApi, Coordinator, CrawlSummary, HttpArchive};
pub use state::Resolution;
pub use storage::{HashRecorder, SqliteHashStore, SqliteLedger, WorkLedger};
