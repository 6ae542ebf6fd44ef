use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Rating-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Crawl frontier and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of identifiers fetched at the same time
    #[serde(
        rename = "max-concurrent-fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: u32,

    /// First identifier of a fresh crawl
    #[serde(rename = "start-id", default = "default_start_id")]
    pub start_id: u64,

    /// Exclusive upper bound of the identifier space
    #[serde(rename = "end-id", default = "default_end_id")]
    pub end_id: u64,
}

/// Profile page fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Base URL that identifiers are appended to (must end with '/')
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Timeout for a single request attempt (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per identifier before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON Lines dataset
    #[serde(rename = "dataset-path")]
    pub dataset_path: PathBuf,
}

/// Control API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the control API listens on (host:port)
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_max_concurrent_fetches() -> u32 {
    500
}

fn default_start_id() -> u64 {
    1
}

fn default_end_id() -> u64 {
    100_000_000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
