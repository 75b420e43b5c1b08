//! Storage module for persisting scrape results
//!
//! This module handles the two files a run reads and writes:
//! - the CSV ledger of processed job ads, which doubles as the
//!   deduplication store for later runs
//! - the JSON listings file produced by the pagination stage

mod error;
mod ledger;
mod listings;

pub use error::{StorageError, StorageResult};
pub use ledger::{CsvLedger, LEDGER_HEADER};
pub use listings::{load_listings, save_listings};

use crate::extraction::ContactInfo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A job advertisement found on a search results page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    /// Absolute URL of the job ad; unique key of the ledger
    pub detail_url: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
}

/// One ledger line: a job listing joined with up to two contacts
///
/// Missing values are written as empty fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub detail_url: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_name1: String,
    #[serde(default)]
    pub contact_title1: String,
    #[serde(default)]
    pub contact_email1: String,
    #[serde(default)]
    pub contact_phone1: String,
    #[serde(default)]
    pub contact_name2: String,
    #[serde(default)]
    pub contact_title2: String,
    #[serde(default)]
    pub contact_email2: String,
    #[serde(default)]
    pub contact_phone2: String,
}

impl LedgerRow {
    /// Builds a row from a listing and its contacts; only the first two are used
    pub fn from_listing(listing: &JobListing, contacts: &[ContactInfo]) -> Self {
        let first = contacts.first().cloned().unwrap_or_default();
        let second = contacts.get(1).cloned().unwrap_or_default();

        Self {
            detail_url: listing.detail_url.clone(),
            job_title: listing.job_title.clone(),
            company: listing.company.clone(),
            location: listing.location.clone(),
            contact_name1: first.name.unwrap_or_default(),
            contact_title1: first.title.unwrap_or_default(),
            contact_email1: first.email.unwrap_or_default(),
            contact_phone1: first.phone.unwrap_or_default(),
            contact_name2: second.name.unwrap_or_default(),
            contact_title2: second.title.unwrap_or_default(),
            contact_email2: second.email.unwrap_or_default(),
            contact_phone2: second.phone.unwrap_or_default(),
        }
    }

    /// Returns true if at least one contact field is filled
    pub fn has_contact(&self) -> bool {
        self.contact_fields().iter().any(|f| !f.is_empty())
    }

    /// Returns true if any contact email is filled
    pub fn has_email(&self) -> bool {
        !self.contact_email1.is_empty() || !self.contact_email2.is_empty()
    }

    /// Returns true if any contact phone is filled
    pub fn has_phone(&self) -> bool {
        !self.contact_phone1.is_empty() || !self.contact_phone2.is_empty()
    }

    fn contact_fields(&self) -> [&str; 8] {
        [
            &self.contact_name1,
            &self.contact_title1,
            &self.contact_email1,
            &self.contact_phone1,
            &self.contact_name2,
            &self.contact_title2,
            &self.contact_email2,
            &self.contact_phone2,
        ]
    }
}

/// Drops listings already recorded in the ledger
///
/// Duplicates within `listings` keep their first occurrence. The keys of the
/// returned map are the work order of the dispatcher.
///
/// # Example
///
/// ```
/// use jobbank_leads::storage::{filter_new_listings, JobListing};
/// use std::collections::HashSet;
///
/// let listing = |url: &str| JobListing { detail_url: url.to_string(), ..Default::default() };
/// let seen: HashSet<String> = ["https://a.dk/1".to_string()].into();
///
/// let work = filter_new_listings(vec![listing("https://a.dk/1"), listing("https://a.dk/2")], &seen);
/// assert_eq!(work.keys().collect::<Vec<_>>(), vec!["https://a.dk/2"]);
/// ```
pub fn filter_new_listings(
    listings: Vec<JobListing>,
    seen: &HashSet<String>,
) -> BTreeMap<String, JobListing> {
    let mut work = BTreeMap::new();

    for listing in listings {
        if listing.detail_url.is_empty() || seen.contains(&listing.detail_url) {
            continue;
        }
        work.entry(listing.detail_url.clone()).or_insert(listing);
    }

    work
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(url: &str, title: &str) -> JobListing {
        JobListing {
            detail_url: url.to_string(),
            job_title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_drops_seen_and_duplicates() {
        let seen: HashSet<String> = ["https://a.dk/1".to_string()].into();
        let work = filter_new_listings(
            vec![
                listing("https://a.dk/1", "old"),
                listing("https://a.dk/2", "first"),
                listing("https://a.dk/2", "second"),
                listing("", "no url"),
            ],
            &seen,
        );

        assert_eq!(work.len(), 1);
        assert_eq!(work["https://a.dk/2"].job_title, "first");
    }

    #[test]
    fn test_filter_everything_seen() {
        let seen: HashSet<String> = ["https://a.dk/1".to_string()].into();
        assert!(filter_new_listings(vec![listing("https://a.dk/1", "")], &seen).is_empty());
    }

    #[test]
    fn test_row_from_listing_with_one_contact() {
        let contact = ContactInfo {
            name: Some("Jane Doe".to_string()),
            title: Some("HR".to_string()),
            email: Some("jane@acme.com".to_string()),
            phone: Some("12345678".to_string()),
        };
        let row = LedgerRow::from_listing(&listing("u1", "Dev"), &[contact]);

        assert_eq!(row.contact_name1, "Jane Doe");
        assert_eq!(row.contact_phone1, "12345678");
        assert_eq!(row.contact_name2, "");
        assert!(row.has_contact());
        assert!(row.has_email());
    }

    #[test]
    fn test_row_uses_first_two_contacts() {
        let named = |n: &str| ContactInfo {
            name: Some(n.to_string()),
            ..Default::default()
        };
        let row = LedgerRow::from_listing(&listing("u1", ""), &[named("A B"), named("C D"), named("E F")]);

        assert_eq!(row.contact_name1, "A B");
        assert_eq!(row.contact_name2, "C D");
        assert!(!row.has_email());
        assert!(!row.has_phone());
    }
}
