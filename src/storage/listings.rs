//! JSON file of collected job listings

use crate::storage::{JobListing, StorageError, StorageResult};
use std::fs;
use std::path::Path;

/// Reads the listings written by the pagination stage
///
/// A missing file is an error, since the contact stage has nothing to work on.
pub fn load_listings(path: &Path) -> StorageResult<Vec<JobListing>> {
    if !path.exists() {
        return Err(StorageError::MissingInput(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let listings: Vec<JobListing> = serde_json::from_str(&content)?;
    tracing::debug!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}

/// Writes the listings as a pretty-printed JSON array, replacing the file
pub fn save_listings(path: &Path, listings: &[JobListing]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(listings)?;
    fs::write(path, json)?;
    tracing::info!("Saved {} listings to {}", listings.len(), path.display());
    Ok(())
}
