//! Configuration module for Jobbank-Leads
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every component receives the parts of [`Config`] it needs at construction.
//!
//! # Example
//!
//! ```no_run
//! use jobbank_leads::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("jobbank.toml")).unwrap();
//! println!("Ledger: {}", config.output.ledger_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_listing_schema, default_pagination_schema, CacheMode, Config, DispatcherConfig,
    DisplayMode, ExtractionConfig, LlmConfig, MonitorConfig, OutputConfig, RateLimiterConfig,
    SiteConfig, StrategyKind, UserAgentConfig, DEFAULT_LLM_INSTRUCTION,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
