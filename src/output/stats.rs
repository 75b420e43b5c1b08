//! Run summaries and ledger statistics
//!
//! This module provides the totals printed at the end of a run and the
//! `--stats` view of an existing ledger.

use crate::storage::{CsvLedger, StorageResult};
use chrono::{DateTime, Utc};

/// Totals of a single pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Listings found by the pagination walk or read from the listings file
    pub listings_discovered: usize,

    /// Listings already present in the ledger
    pub skipped_duplicates: usize,

    /// URLs handed to the dispatcher
    pub dispatched: usize,

    /// Fetches that ended in a failed result
    pub failed: usize,

    /// Contacts dropped as placeholders
    pub rejected_contacts: usize,

    /// Rows appended to the ledger
    pub rows_written: usize,
}

impl RunSummary {
    /// Starts a summary stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            listings_discovered: 0,
            skipped_duplicates: 0,
            dispatched: 0,
            failed: 0,
            rejected_contacts: 0,
            rows_written: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run time in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();
    println!("  Listings discovered: {}", summary.listings_discovered);
    println!("  Skipped (already in ledger): {}", summary.skipped_duplicates);
    println!("  Dispatched: {}", summary.dispatched);
    println!("  Failed: {}", summary.failed);
    println!("  Placeholder contacts rejected: {}", summary.rejected_contacts);
    println!("  New rows written: {}", summary.rows_written);
}

/// Contents of a ledger at a glance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStatistics {
    pub total_rows: usize,

    /// Rows with at least one contact field filled
    pub rows_with_contact: usize,

    pub rows_with_email: usize,

    pub rows_with_phone: usize,
}

/// Loads statistics from the ledger
///
/// # Arguments
///
/// * `ledger` - The ledger to read
///
/// # Returns
///
/// * `Ok(LedgerStatistics)` - Totals; all zero for a missing ledger
/// * `Err(StorageError)` - The ledger is unreadable
pub fn load_ledger_statistics(ledger: &CsvLedger) -> StorageResult<LedgerStatistics> {
    let rows = ledger.load_rows()?;

    Ok(LedgerStatistics {
        total_rows: rows.len(),
        rows_with_contact: rows.iter().filter(|r| r.has_contact()).count(),
        rows_with_email: rows.iter().filter(|r| r.has_email()).count(),
        rows_with_phone: rows.iter().filter(|r| r.has_phone()).count(),
    })
}

/// Prints ledger statistics to stdout
pub fn print_ledger_statistics(stats: &LedgerStatistics) {
    let percentage = |count: usize| {
        if stats.total_rows > 0 {
            count as f64 / stats.total_rows as f64 * 100.0
        } else {
            0.0
        }
    };

    println!("=== Ledger Statistics ===\n");
    println!("  Job ads recorded: {}", stats.total_rows);
    println!(
        "  With a contact: {} ({:.1}%)",
        stats.rows_with_contact,
        percentage(stats.rows_with_contact)
    );
    println!(
        "  With an email: {} ({:.1}%)",
        stats.rows_with_email,
        percentage(stats.rows_with_email)
    );
    println!(
        "  With a phone number: {} ({:.1}%)",
        stats.rows_with_phone,
        percentage(stats.rows_with_phone)
    );
}
