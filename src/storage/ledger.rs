//! CSV ledger of processed job ads
//!
//! The ledger is append-only. A new file starts with a UTF-8 byte order mark
//! followed by the header so spreadsheet tools pick the right encoding; the
//! mark is tolerated when reading.

use crate::storage::{LedgerRow, StorageError, StorageResult};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column order of the ledger file
pub const LEDGER_HEADER: [&str; 12] = [
    "detail_url",
    "job_title",
    "company",
    "location",
    "contact_name1",
    "contact_title1",
    "contact_email1",
    "contact_phone1",
    "contact_name2",
    "contact_title2",
    "contact_email2",
    "contact_phone2",
];

const BOM: &str = "\u{feff}";

/// Ledger stored as a CSV file
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every `detail_url` recorded in the ledger
    ///
    /// # Returns
    ///
    /// * `Ok(HashSet)` - Recorded URLs; empty when the file is missing or empty
    /// * `Err(StorageError::MalformedLedger)` - No `detail_url` column or an unreadable record
    pub fn load_seen(&self) -> StorageResult<HashSet<String>> {
        let Some(content) = self.read_content()? else {
            return Ok(HashSet::new());
        };

        let mut reader = ReaderBuilder::new().from_reader(content.as_bytes());
        let headers = reader.headers().map_err(|e| self.malformed(e))?.clone();
        let column = url_column(&headers).ok_or_else(|| {
            StorageError::MalformedLedger(format!(
                "{} has no detail_url column",
                self.path.display()
            ))
        })?;

        let mut seen = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.malformed(e))?;
            if let Some(url) = record.get(column).map(str::trim).filter(|u| !u.is_empty()) {
                seen.insert(url.to_string());
            }
        }

        tracing::debug!("Loaded {} recorded URLs from {}", seen.len(), self.path.display());
        Ok(seen)
    }

    /// Loads every row of the ledger
    pub fn load_rows(&self) -> StorageResult<Vec<LedgerRow>> {
        let Some(content) = self.read_content()? else {
            return Ok(Vec::new());
        };

        let mut reader = ReaderBuilder::new().from_reader(content.as_bytes());
        let headers = reader.headers().map_err(|e| self.malformed(e))?.clone();
        if url_column(&headers).is_none() {
            return Err(StorageError::MalformedLedger(format!(
                "{} has no detail_url column",
                self.path.display()
            )));
        }

        reader
            .deserialize()
            .map(|row| row.map_err(|e| self.malformed(e)))
            .collect()
    }

    /// Appends rows to the ledger
    ///
    /// The header is written when the file is missing or blank. Rows whose URL
    /// is already recorded, or repeated within `rows`, are skipped. An existing
    /// file must carry exactly the ledger header; nothing is written otherwise.
    ///
    /// # Returns
    ///
    /// The number of rows written
    pub fn append(&self, rows: &[LedgerRow]) -> StorageResult<usize> {
        let mut seen = self.load_seen()?;
        let fresh: Vec<&LedgerRow> = rows
            .iter()
            .filter(|row| {
                let new = seen.insert(row.detail_url.clone());
                if !new {
                    tracing::debug!("Skipping already recorded {}", row.detail_url);
                }
                new
            })
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        let existing = self.read_raw()?;
        let needs_header = match existing.as_deref().map(strip_bom) {
            Some(content) if !content.trim().is_empty() => {
                self.check_header(content)?;
                false
            }
            _ => true,
        };

        // Header and rows go out in a single write
        let mut buffer: Vec<u8> = Vec::new();
        if needs_header {
            buffer.extend_from_slice(BOM.as_bytes());
        } else if existing.as_deref().is_some_and(|raw| !raw.ends_with('\n')) {
            buffer.push(b'\n');
        }
        {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut buffer);
            if needs_header {
                writer.write_record(LEDGER_HEADER)?;
            }
            for row in &fresh {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        if needs_header {
            // A blank file holds no rows and is replaced
            options.create(true).write(true).truncate(true);
        } else {
            options.append(true);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(&buffer)?;
        file.flush()?;

        tracing::info!("Appended {} rows to {}", fresh.len(), self.path.display());
        Ok(fresh.len())
    }

    /// Raw file content; None for a missing file
    fn read_raw(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// File content without the byte order mark; None for a missing or blank file
    fn read_content(&self) -> StorageResult<Option<String>> {
        Ok(self
            .read_raw()?
            .map(|raw| strip_bom(&raw).to_string())
            .filter(|content| !content.trim().is_empty()))
    }

    fn check_header(&self, content: &str) -> StorageResult<()> {
        let mut reader = ReaderBuilder::new().from_reader(content.as_bytes());
        let headers = reader.headers().map_err(|e| self.malformed(e))?;
        if headers.iter().map(str::trim).eq(LEDGER_HEADER) {
            Ok(())
        } else {
            Err(StorageError::MalformedLedger(format!(
                "{} has header '{}', expected '{}'",
                self.path.display(),
                headers.iter().collect::<Vec<_>>().join(","),
                LEDGER_HEADER.join(",")
            )))
        }
    }

    fn malformed(&self, error: csv::Error) -> StorageError {
        StorageError::MalformedLedger(format!("{}: {}", self.path.display(), error))
    }
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix(BOM).unwrap_or(content)
}

fn url_column(headers: &StringRecord) -> Option<usize> {
    headers.iter().position(|h| h.trim() == "detail_url")
}
