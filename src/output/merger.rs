//! Result merger
//!
//! Joins every successful fetch result with the listing it was dispatched
//! for and flattens the contacts into a ledger row.

use crate::crawler::FetchResult;
use crate::extraction::ContactInfo;
use crate::storage::{JobListing, LedgerRow};
use std::collections::BTreeMap;

/// Contacts per ledger row
const CONTACTS_PER_ROW: usize = 2;

/// Well-known placeholder identities, compared case-insensitively
pub const PLACEHOLDER_NAMES: &[&str] = &[
    "john doe",
    "jane smith",
    "john smith",
    "richard roe",
    "max mustermann",
    "erika mustermann",
    "ola nordmann",
    "kari nordmann",
    "firstname lastname",
];

const PLACEHOLDER_EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// Rows built from a batch of results, plus what was left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub rows: Vec<LedgerRow>,
    /// Failed results, excluded from the ledger
    pub failed: usize,
    /// Successful results whose URL is not in the work order
    pub unmatched: usize,
    /// Contacts dropped as placeholders
    pub rejected_contacts: usize,
}

/// Returns true if the contact looks invented rather than taken from the ad
///
/// # Example
///
/// ```
/// use jobbank_leads::extraction::ContactInfo;
/// use jobbank_leads::output::is_placeholder_identity;
///
/// let contact = ContactInfo { name: Some("JOHN  Doe".to_string()), ..Default::default() };
/// assert!(is_placeholder_identity(&contact));
/// ```
pub fn is_placeholder_identity(contact: &ContactInfo) -> bool {
    let name_is_placeholder = contact.name.as_deref().is_some_and(|name| {
        let normalized = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        PLACEHOLDER_NAMES.contains(&normalized.as_str())
    });

    let email_is_placeholder = contact.email.as_deref().is_some_and(|email| {
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim().to_lowercase())
            .is_some_and(|domain| PLACEHOLDER_EMAIL_DOMAINS.contains(&domain.as_str()))
    });

    name_is_placeholder || email_is_placeholder
}

/// Builds ledger rows from fetch results
///
/// # Arguments
///
/// * `results` - One result per dispatched URL
/// * `listings` - The work order the results were dispatched from
///
/// # Returns
///
/// A [`MergeReport`] with one row per successful, matched result
pub fn merge(results: &[FetchResult], listings: &BTreeMap<String, JobListing>) -> MergeReport {
    let mut report = MergeReport::default();

    for result in results {
        if !result.success {
            tracing::warn!(
                "Error processing {}: {}",
                result.url,
                result.error_message.as_deref().unwrap_or("unknown error")
            );
            report.failed += 1;
            continue;
        }

        let Some(listing) = listings.get(&result.url) else {
            tracing::warn!("Result for {} matches no listing", result.url);
            report.unmatched += 1;
            continue;
        };

        let mut contacts: Vec<ContactInfo> = Vec::new();
        for contact in result.payload.iter().flat_map(|p| p.contacts()) {
            if contact.is_empty() {
                continue;
            }
            if is_placeholder_identity(&contact) {
                tracing::warn!(
                    "Rejected placeholder contact {:?} <{}> for {}",
                    contact.name.as_deref().unwrap_or(""),
                    contact.email.as_deref().unwrap_or(""),
                    result.url
                );
                report.rejected_contacts += 1;
                continue;
            }
            contacts.push(contact);
        }
        contacts.truncate(CONTACTS_PER_ROW);

        tracing::debug!("{} contacts for {}", contacts.len(), result.url);
        report.rows.push(LedgerRow::from_listing(listing, &contacts));
    }

    report
}
