//! Jobbank-Leads: a job listing contact harvester
//!
//! This crate walks the paginated search results of a job listing site,
//! visits every job advertisement that is not already recorded in the CSV
//! ledger, extracts the contact persons named in the ad and appends the new
//! rows to the ledger.

pub mod config;
pub mod crawler;
pub mod extraction;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Jobbank-Leads operations
#[derive(Debug, Error)]
pub enum LeadsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
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

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Jobbank-Leads operations
pub type Result<T> = std::result::Result<T, LeadsError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchResult, RunConfig};
pub use extraction::{ContactInfo, ExtractedPayload};
pub use storage::{JobListing, LedgerRow};
