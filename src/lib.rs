//! Rating-Harvester: a resumable professor-profile crawler
//!
//! This crate walks a numerically indexed profile site, extracts one structured
//! record per existing profile, and appends the records to a JSON Lines dataset.
//! The crawl runs as a background job that can be started, paused, and queried
//! through a small HTTP control API.

pub mod config;
pub mod control;
pub mod crawler;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Rating-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Crawl task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Result type alias for Rating-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use control::{JobController, JobStatus, PauseOutcome, StartOutcome};
pub use record::{ProfessorRecord, RatingEntry};
