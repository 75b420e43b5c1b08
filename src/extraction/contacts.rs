//! Pattern-based contact extraction
//!
//! Used when no LLM is available. Emails and phone numbers are found by
//! regular expressions; the name for an email is the closest capitalised
//! two- or three-word phrase in front of it, optionally followed by a title
//! after a dash or pipe.

use crate::extraction::schema::scoped_text;
use crate::extraction::{ContactInfo, ExtractionError};
use regex::Regex;
use std::sync::OnceLock;

/// How far in front of an email a name may appear (bytes)
const NAME_WINDOW: usize = 120;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
            .expect("email pattern is valid")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+\d{2}[\s-]?)?\b\d{2}[\s-]?\d{2}[\s-]?\d{2}[\s-]?\d{2}\b")
            .expect("phone pattern is valid")
    })
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\p{Lu}\p{Ll}+(?:[ -]\p{Lu}\p{Ll}+){1,2})\b(?:\s*[-|–]\s*(\p{L}[\p{L}-]*\p{L}))?")
            .expect("name pattern is valid")
    })
}

/// Settings of the pattern-based extractor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegexStrategy {
    /// Element holding the job ad body; the whole page when absent or unmatched
    pub container_selector: Option<String>,
}

impl RegexStrategy {
    pub fn new(container_selector: Option<String>) -> Self {
        Self { container_selector }
    }

    /// Extracts contacts from an HTML page
    pub fn extract(&self, html: &str) -> Result<Vec<ContactInfo>, ExtractionError> {
        let text = scoped_text(html, self.container_selector.as_deref())?;
        Ok(extract_contacts_from_text(&text))
    }
}

struct NameCandidate {
    end: usize,
    name: String,
    title: Option<String>,
}

/// Pairs every email with the nearest preceding name and the phone numbers in order
///
/// Without emails, every phone number becomes a contact of its own.
pub fn extract_contacts_from_text(text: &str) -> Vec<ContactInfo> {
    let names: Vec<NameCandidate> = name_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            Some(NameCandidate {
                end: name.end(),
                name: name.as_str().to_string(),
                title: caps.get(2).map(|t| t.as_str().trim().to_string()),
            })
        })
        .collect();

    let mut emails: Vec<(usize, String)> = Vec::new();
    for m in email_regex().find_iter(text) {
        if !emails.iter().any(|(_, e)| e.eq_ignore_ascii_case(m.as_str())) {
            emails.push((m.start(), m.as_str().to_string()));
        }
    }

    let mut phones: Vec<(usize, String)> = Vec::new();
    for m in phone_regex().find_iter(text) {
        let phone = m.as_str().trim().to_string();
        if !phones.iter().any(|(_, p)| *p == phone) {
            phones.push((m.start(), phone));
        }
    }

    let anchors = if emails.is_empty() { &phones } else { &emails };

    anchors
        .iter()
        .enumerate()
        .map(|(index, (position, value))| {
            let candidate = nearest_name(&names, *position);
            let (email, phone) = if emails.is_empty() {
                (None, Some(value.clone()))
            } else {
                (Some(value.clone()), phones.get(index).map(|(_, p)| p.clone()))
            };

            ContactInfo {
                name: candidate.map(|c| c.name.clone()),
                title: candidate.and_then(|c| c.title.clone()),
                email,
                phone,
            }
        })
        .collect()
}

fn nearest_name(names: &[NameCandidate], position: usize) -> Option<&NameCandidate> {
    names
        .iter()
        .rev()
        .find(|c| c.end <= position && position - c.end <= NAME_WINDOW)
}
