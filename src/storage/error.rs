//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the ledger and listings files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("Malformed ledger: {0}")]
    MalformedLedger(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
