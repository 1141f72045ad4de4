//! Configuration module for Archive-Hasher
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so running without a file is equivalent to
//! loading an empty one.
//!
//! # Example
//!
//! ```no_run
//! use archive_hasher::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hasher.toml")).unwrap();
//! println!("Listing pages hold {} entries", config.crawler.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
