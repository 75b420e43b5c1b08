//! LLM-based contact extraction
//!
//! Page text is split into overlapping word chunks, each chunk is sent to an
//! OpenAI-compatible chat completions endpoint together with the extraction
//! instruction and a JSON schema, and the returned contact objects are
//! concatenated.

use crate::config::LlmConfig;
use crate::extraction::schema::scoped_text;
use crate::extraction::ExtractionError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the LLM endpoint
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Chunking parameters for long pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunking {
    /// Maximum words per chunk
    pub threshold: usize,
    /// Fraction of a chunk repeated at the start of the next one
    pub overlap_rate: f64,
}

/// Per-run settings of an LLM extraction
#[derive(Debug, Clone, PartialEq)]
pub struct LlmStrategy {
    pub model: String,
    pub instruction: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub chunking: Option<Chunking>,
    /// Element whose text is sent; the whole page when absent or unmatched
    pub scope_selector: Option<String>,
}

impl LlmStrategy {
    pub fn from_config(config: &LlmConfig, scope_selector: Option<String>) -> Self {
        Self {
            model: config.model.clone(),
            instruction: config.instruction.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            chunking: config.apply_chunking.then_some(Chunking {
                threshold: config.chunk_token_threshold,
                overlap_rate: config.overlap_rate,
            }),
            scope_selector,
        }
    }

    /// Text of the page that is sent to the model
    pub fn page_text(&self, html: &str) -> Result<String, ExtractionError> {
        scoped_text(html, self.scope_selector.as_deref())
    }

    fn chunks(&self, text: &str) -> Vec<String> {
        match self.chunking {
            Some(chunking) => chunk_text(text, chunking.threshold, chunking.overlap_rate),
            None if text.trim().is_empty() => Vec::new(),
            None => vec![text.to_string()],
        }
    }
}

/// Splits text into word chunks of at most `threshold` words
///
/// Consecutive chunks share `floor(threshold * overlap_rate)` words.
pub fn chunk_text(text: &str, threshold: usize, overlap_rate: f64) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let threshold = threshold.max(1);
    let overlap = ((threshold as f64) * overlap_rate).floor() as usize;
    let step = threshold.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + threshold).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// JSON schema the model must answer with
pub fn contact_schema() -> Value {
    let nullable_string = |description: &str| {
        json!({ "type": ["string", "null"], "description": description })
    };

    json!({
        "type": "object",
        "properties": {
            "contacts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": nullable_string("Full name of the contact person"),
                        "title": nullable_string("Job title of the contact person"),
                        "email": nullable_string("Email address of the contact person"),
                        "phone": nullable_string("Phone number of the contact person"),
                    },
                    "required": ["name", "title", "email", "phone"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["contacts"],
        "additionalProperties": false
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Minimal client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from the API key in the configured environment variable
    ///
    /// Returns `Ok(None)` when the variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, reqwest::Error> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(key, config.api_base.clone())?)),
            _ => Ok(None),
        }
    }

    /// Extracts contact objects from page text, one request per chunk
    pub async fn extract_contacts(
        &self,
        strategy: &LlmStrategy,
        text: &str,
    ) -> Result<Vec<Value>, LlmError> {
        let mut contacts: Vec<Value> = Vec::new();

        for (index, chunk) in strategy.chunks(text).iter().enumerate() {
            let found = self.complete_chunk(strategy, chunk).await?;
            tracing::trace!(chunk = index, contacts = found.len(), "LLM chunk extracted");

            for contact in found {
                if !contacts.contains(&contact) {
                    contacts.push(contact);
                }
            }
        }

        Ok(contacts)
    }

    async fn complete_chunk(&self, strategy: &LlmStrategy, chunk: &str) -> Result<Vec<Value>, LlmError> {
        let request = ChatRequest {
            model: &strategy.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &strategy.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: chunk,
                },
            ],
            temperature: strategy.temperature,
            max_tokens: strategy.max_tokens,
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "contact_info",
                    "schema": contact_schema(),
                    "strict": true
                }
            }),
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "LLM API error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Parse("response has no message content".to_string()))?;

        parse_contacts(&content)
    }
}

/// Reads `{"contacts": [...]}` or a bare array from a model answer
fn parse_contacts(content: &str) -> Result<Vec<Value>, LlmError> {
    let value: Value =
        serde_json::from_str(content.trim()).map_err(|e| LlmError::Parse(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("contacts") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(LlmError::Parse(format!(
                "'contacts' is not an array: {}",
                other
            ))),
        },
        other => Err(LlmError::Parse(format!("unexpected answer: {}", other))),
    }
}
