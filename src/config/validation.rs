use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_archive_config(&config.archive)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.batch_size < 1 || config.batch_size > 10_000 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 10000, got {}",
            config.batch_size
        )));
    }

    // item_delay_ms may be zero; tests rely on that

    Ok(())
}

/// Validates archive connection configuration
fn validate_archive_config(config: &ArchiveConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.ledger_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger_path cannot be empty".to_string(),
        ));
    }

    if config.hashes_path.is_empty() {
        return Err(ConfigError::Validation(
            "hashes_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
