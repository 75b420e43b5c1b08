//! Output module for turning fetch results into ledger rows and reports
//!
//! This module handles:
//! - Merging extraction payloads back onto listing metadata
//! - Rejecting placeholder contacts invented by the model
//! - Run summaries and ledger statistics

mod merger;
pub mod stats;

pub use merger::{is_placeholder_identity, merge, MergeReport, PLACEHOLDER_NAMES};
pub use stats::{
    load_ledger_statistics, print_ledger_statistics, print_summary, LedgerStatistics, RunSummary,
};
