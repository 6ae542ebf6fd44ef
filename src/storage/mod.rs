//! Storage module for persisting crawl output
//!
//! The dataset is a single JSON Lines file that is only ever appended to.
//! This module handles:
//! - Appending records with a write guard shared by all writers
//! - Read-only scans used by the control API and resume logic
//!   (line count, first lines, maximum recorded identifier)
//! - Listing the directory that holds the dataset

mod jsonl;

pub use jsonl::JsonlDataset;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File name used when the dataset is offered for download
pub const DOWNLOAD_FILE_NAME: &str = "professors_dataset.jsonl";
