//! Configuration module for Rating-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use rating_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Crawl will keep {} fetches in flight", config.crawler.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetcherConfig, OutputConfig, ServerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
