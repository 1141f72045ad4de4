//! Output module for reporting on crawl state
//!
//! This module handles:
//! - Loading statistics from the work ledger and hash store
//! - Printing them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
