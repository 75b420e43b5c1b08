//! Extraction strategies for listing and detail pages
//!
//! A fetched page is turned into an [`ExtractedPayload`] by one of three
//! strategies:
//!
//! - `Schema`: CSS selectors mapped to named fields
//! - `Llm`: chunked page text sent to an OpenAI-compatible chat endpoint
//! - `Regex`: email and phone patterns with nearby name candidates

mod contacts;
mod llm;
mod payload;
pub(crate) mod schema;

use thiserror::Error;

pub use contacts::{extract_contacts_from_text, RegexStrategy};
pub use llm::{chunk_text, contact_schema, Chunking, LlmClient, LlmError, LlmStrategy};
pub use payload::{ContactInfo, ExtractedPayload};
pub use schema::{normalize_whitespace, scoped_text, ExtractionSchema, FieldKind, FieldSpec};

/// Errors raised while applying an extraction strategy
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid selector {0}")]
    InvalidSelector(String),

    #[error("LLM extraction failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Strategy not available: {0}")]
    Unsupported(String),
}

impl ExtractionError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Llm(e) => e.status(),
            _ => None,
        }
    }

    /// Returns true if the LLM endpoint could not be reached
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Llm(LlmError::Network(_)))
    }
}

/// How a page is turned into a payload
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStrategy {
    Schema(ExtractionSchema),
    Llm(LlmStrategy),
    Regex(RegexStrategy),
}

impl ExtractionStrategy {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::Llm(_) => "llm",
            Self::Regex(_) => "regex",
        }
    }
}
