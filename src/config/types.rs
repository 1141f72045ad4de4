use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Archive-Hasher
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
}

/// Crawl pacing and retry policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of listing entries requested per page
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Pause before every item-level request (milliseconds)
    #[serde(rename = "item-delay-ms")]
    pub item_delay_ms: u64,

    /// Retry a failed listing page once at the following page
    #[serde(rename = "retry-next-page")]
    pub retry_next_page: bool,
}

impl CrawlerConfig {
    /// The pause before every item-level request
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            item_delay_ms: 1000,
            retry_next_page: true,
        }
    }
}

/// Remote archive connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root URL the search and metadata endpoints hang off
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://archive.org".to_string(),
            user_agent: format!("archive-hasher/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the work ledger database
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Path to the content hash database
    #[serde(rename = "hashes-path")]
    pub hashes_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ledger_path: "working.db".to_string(),
            hashes_path: "hashes.db".to_string(),
        }
    }
}
