use crate::config::types::{Config, CrawlerConfig, FetcherConfig, OutputConfig, ServerConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Upper bound on in-flight fetches; beyond this the process runs out of sockets
const MAX_CONCURRENT_FETCHES: u32 = 2000;

/// Largest accepted `end_id`; identifiers stay exact as JSON numbers
const MAX_END_ID: u64 = 1 << 53;

/// Upper bound on attempts per identifier
const MAX_ATTEMPTS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    if config.start_id < 1 {
        return Err(ConfigError::Validation("start_id must be >= 1".to_string()));
    }

    if config.end_id <= config.start_id {
        return Err(ConfigError::Validation(format!(
            "end_id ({}) must be greater than start_id ({})",
            config.end_id, config.start_id
        )));
    }

    if config.end_id > MAX_END_ID {
        return Err(ConfigError::Validation(format!(
            "end_id must be at most {}, got {}",
            MAX_END_ID, config.end_id
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    // Identifiers are joined onto the last path segment
    if !url.path().ends_with('/') {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must end with '/'",
            config.base_url
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation("timeout_secs must be >= 1".to_string()));
    }

    if config.max_attempts < 1 || config.max_attempts > MAX_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS, config.max_attempts
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dataset_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("dataset_path cannot be empty".to_string()));
    }

    if config.dataset_path.file_name().is_none() {
        return Err(ConfigError::Validation(format!(
            "dataset_path '{}' must name a file",
            config.dataset_path.display()
        )));
    }

    Ok(())
}

/// Validates control API configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid bind address '{}': {}", config.bind, e))
    })?;
    Ok(())
}
