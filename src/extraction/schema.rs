//! Selector-based structured extraction
//!
//! An [`ExtractionSchema`] maps field names to CSS selectors. Every element
//! matched by the base selector produces one record; each field is read from
//! the first matching element inside it.

use crate::extraction::ExtractionError;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

/// How a field value is read from the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Concatenated, whitespace-normalised text content
    #[default]
    Text,
    /// Inner HTML of the element
    Html,
    /// Value of the attribute named by `attribute`
    Attribute,
}

/// A single named field of a schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub attribute: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, selector: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind,
            attribute: None,
        }
    }

    pub fn attribute(name: &str, selector: &str, attribute: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            kind: FieldKind::Attribute,
            attribute: Some(attribute.to_string()),
        }
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self.kind {
            FieldKind::Text => normalize_whitespace(&element.text().collect::<String>()),
            FieldKind::Html => element.inner_html().trim().to_string(),
            FieldKind::Attribute => {
                let name = self.attribute.as_deref()?;
                element.value().attr(name)?.trim().to_string()
            }
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Field name to selector mapping applied under a base selector
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractionSchema {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "base-selector")]
    pub base_selector: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    /// Applies the schema to an HTML document
    ///
    /// Records with no matching field are dropped. A field selector that
    /// matches the base element itself reads from that element.
    ///
    /// # Example
    ///
    /// ```
    /// use jobbank_leads::extraction::{ExtractionSchema, FieldKind, FieldSpec};
    ///
    /// let schema = ExtractionSchema {
    ///     name: "rows".to_string(),
    ///     base_selector: "li".to_string(),
    ///     fields: vec![FieldSpec::new("title", "span", FieldKind::Text)],
    /// };
    /// let records = schema.extract("<ul><li><span> A </span></li><li><span>B</span></li></ul>").unwrap();
    /// assert_eq!(records.len(), 2);
    /// assert_eq!(records[0]["title"], "A");
    /// ```
    pub fn extract(&self, html: &str) -> Result<Vec<Map<String, Value>>, ExtractionError> {
        let base = parse_selector(&self.base_selector)?;
        let fields = self
            .fields
            .iter()
            .map(|field| Ok((field, parse_selector(&field.selector)?)))
            .collect::<Result<Vec<_>, ExtractionError>>()?;

        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for element in document.select(&base) {
            let mut record = Map::new();

            for (field, selector) in &fields {
                let target = if selector.matches(&element) {
                    Some(element)
                } else {
                    element.select(selector).next()
                };

                if let Some(value) = target.and_then(|t| field.read(t)) {
                    record.insert(field.name.clone(), Value::String(value));
                }
            }

            if !record.is_empty() {
                records.push(record);
            }
        }

        Ok(records)
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector)
        .map_err(|e| ExtractionError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element matching `selector`, or of the whole page
pub fn scoped_text(html: &str, selector: Option<&str>) -> Result<String, ExtractionError> {
    let document = Html::parse_document(html);

    if let Some(selector) = selector {
        let selector = parse_selector(selector)?;
        if let Some(element) = document.select(&selector).next() {
            return Ok(text_of(element));
        }
    }

    Ok(text_of(document.root_element()))
}

fn text_of(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        if let Node::Text(text) = node.value() {
            let skipped = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .map(|element| matches!(element.name(), "script" | "style" | "noscript"))
                .unwrap_or(false);

            if !skipped {
                parts.push(text);
            }
        }
    }

    normalize_whitespace(&parts.join(" "))
}
