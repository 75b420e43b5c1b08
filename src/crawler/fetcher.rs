//! HTTP page crawler
//!
//! This module handles all page requests of a run, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with an optional in-memory page cache
//! - Applying an extraction strategy to the fetched page
//! - Turning HTTP and extraction errors into failed results

use crate::config::{CacheMode, UserAgentConfig};
use crate::extraction::{ExtractedPayload, ExtractionError, ExtractionStrategy, LlmClient};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of crawling a single URL
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,
    pub success: bool,
    /// Extraction output; present on success
    pub payload: Option<ExtractedPayload>,
    pub error_message: Option<String>,
    /// HTTP status of the page, or of the LLM API when extraction failed there
    pub status_code: Option<u16>,
    /// Set when the failure came from the transport rather than the page
    pub transient: bool,
    /// Retries spent on this URL
    pub retries: u32,
}

impl FetchResult {
    pub fn success(url: impl Into<String>, payload: ExtractedPayload, status_code: Option<u16>) -> Self {
        Self {
            url: url.into(),
            success: true,
            payload: Some(payload),
            error_message: None,
            status_code,
            transient: false,
            retries: 0,
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            url: url.into(),
            success: false,
            payload: None,
            error_message: Some(error.into()),
            status_code,
            transient: false,
            retries: 0,
        }
    }

    /// A failure worth retrying: connection reset, timeout, truncated body
    pub fn network_failure(url: impl Into<String>, error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            transient: true,
            ..Self::failure(url, error, status_code)
        }
    }
}

/// Per-call settings of a crawl: cache behaviour and extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub cache_mode: CacheMode,
    pub strategy: ExtractionStrategy,
}

impl RunConfig {
    pub fn new(cache_mode: CacheMode, strategy: ExtractionStrategy) -> Self {
        Self {
            cache_mode,
            strategy,
        }
    }
}

/// Fetches a page and applies an extraction strategy to it
///
/// Implementations never return errors; every problem is reported as a
/// failed [`FetchResult`].
#[async_trait]
pub trait PageCrawler: Send + Sync {
    async fn crawl(&self, url: &str, config: &RunConfig) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use jobbank_leads::config::UserAgentConfig;
/// use jobbank_leads::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "JobbankLeads".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: None,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    match &config.contact_email {
        Some(email) => format!(
            "{}/{} (+{}; {})",
            config.crawler_name, config.crawler_version, config.contact_url, email
        ),
        None => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, config.contact_url
        ),
    }
}

/// [`PageCrawler`] backed by `reqwest`
pub struct HttpCrawler {
    client: Client,
    cache: Mutex<HashMap<String, String>>,
    llm: Option<LlmClient>,
}

impl HttpCrawler {
    /// Creates a crawler; `llm` is required only for the LLM strategy
    pub fn new(user_agent: &UserAgentConfig, llm: Option<LlmClient>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            cache: Mutex::new(HashMap::new()),
            llm,
        })
    }

    /// Returns true if an LLM client is available
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Fetches the page body, consulting the cache when enabled
    ///
    /// Non-success statuses and network errors are returned as failed results.
    async fn fetch_page(&self, url: &str, cache_mode: CacheMode) -> Result<(String, Option<u16>), FetchResult> {
        if cache_mode == CacheMode::Enabled {
            let cached = self
                .cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(url)
                .cloned();
            if let Some(body) = cached {
                tracing::trace!("Cache hit for {}", url);
                return Ok((body, None));
            }
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            FetchResult::network_failure(url, error, None)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchResult::failure(
                url,
                format!("HTTP {}", status),
                Some(status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchResult::network_failure(url, e.to_string(), Some(status.as_u16())))?;

        if cache_mode == CacheMode::Enabled {
            self.cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(url.to_string(), body.clone());
        }

        Ok((body, Some(status.as_u16())))
    }

    async fn extract(
        &self,
        html: &str,
        strategy: &ExtractionStrategy,
    ) -> Result<ExtractedPayload, ExtractionError> {
        match strategy {
            ExtractionStrategy::Schema(schema) => schema.extract(html).map(ExtractedPayload::Schema),
            ExtractionStrategy::Regex(regex) => regex.extract(html).map(ExtractedPayload::Regex),
            ExtractionStrategy::Llm(llm_strategy) => {
                let client = self.llm.as_ref().ok_or_else(|| {
                    ExtractionError::Unsupported("no LLM client configured".to_string())
                })?;
                let text = llm_strategy.page_text(html)?;
                let contacts = client.extract_contacts(llm_strategy, &text).await?;
                Ok(ExtractedPayload::Llm(contacts))
            }
        }
    }
}

#[async_trait]
impl PageCrawler for HttpCrawler {
    async fn crawl(&self, url: &str, config: &RunConfig) -> FetchResult {
        let (html, status) = match self.fetch_page(url, config.cache_mode).await {
            Ok(page) => page,
            Err(failed) => {
                tracing::debug!("Fetch of {} failed: {:?}", url, failed.error_message);
                return failed;
            }
        };

        match self.extract(&html, &config.strategy).await {
            Ok(payload) => {
                tracing::trace!(
                    "{} extraction of {} produced {} records",
                    config.strategy.name(),
                    url,
                    payload.len()
                );
                FetchResult::success(url, payload, status)
            }
            Err(e) if e.is_transient() => FetchResult::network_failure(url, e.to_string(), e.status()),
            Err(e) => FetchResult::failure(url, e.to_string(), e.status()),
        }
    }
}
