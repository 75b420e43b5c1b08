use crate::extraction::{ExtractionSchema, FieldKind, FieldSpec};
use serde::Deserialize;

/// Default instruction sent to the LLM for contact extraction
pub const DEFAULT_LLM_INSTRUCTION: &str = "Extract ONLY contact person data from the job ad, \
including their name, title, email, and phone number as a JSON array. DO NOT ADD JOHN DOE, \
JANE SMITH or any other non-existent data. If no data is present, leave empty. \
Ignore ALL OTHER information.";

/// Main configuration structure for Jobbank-Leads
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(rename = "rate-limiter", default)]
    pub rate_limiter: RateLimiterConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Whether page bodies may be served from the in-memory cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Always fetch from the network
    #[default]
    Bypass,
    /// Reuse a previously fetched body for the same URL
    Enabled,
}

/// Listing site and pagination settings
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// First search results page
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Upper bound on the number of result pages walked
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(rename = "cache-mode", default)]
    pub cache_mode: CacheMode,

    /// Schema producing one record per job listing
    #[serde(rename = "listing-schema", default = "default_listing_schema")]
    pub listing_schema: ExtractionSchema,

    /// Schema producing a `next_page` record
    #[serde(rename = "pagination-schema", default = "default_pagination_schema")]
    pub pagination_schema: ExtractionSchema,
}

/// Which extraction strategy is applied to job detail pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Llm,
    Regex,
    Schema,
}

/// Detail page extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Element holding the job ad body
    #[serde(rename = "container-selector", default = "default_container_selector")]
    pub container_selector: String,

    /// Schema with name/title/email/phone fields, required for the schema strategy
    #[serde(rename = "detail-schema", default)]
    pub detail_schema: Option<ExtractionSchema>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(rename = "apply-chunking", default = "default_true")]
    pub apply_chunking: bool,

    /// Approximate chunk size in words
    #[serde(rename = "chunk-token-threshold", default = "default_chunk_threshold")]
    pub chunk_token_threshold: usize,

    /// Fraction of a chunk repeated at the start of the next chunk
    #[serde(rename = "overlap-rate", default = "default_overlap_rate")]
    pub overlap_rate: f64,

    #[serde(default = "default_instruction")]
    pub instruction: String,
}

/// Bulk dispatcher limits
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Admission pauses while system memory usage is above this percentage
    #[serde(rename = "memory-threshold-percent", default = "default_memory_threshold")]
    pub memory_threshold_percent: f64,

    /// How often memory usage is polled while paused (milliseconds)
    #[serde(rename = "check-interval-ms", default = "default_check_interval")]
    pub check_interval_ms: u64,

    /// Longest admission pause before a fetch is admitted anyway (milliseconds)
    #[serde(rename = "memory-wait-timeout-ms", default = "default_memory_wait_timeout")]
    pub memory_wait_timeout_ms: u64,

    /// Maximum number of concurrent fetches
    #[serde(rename = "max-session-permit", default = "default_max_session_permit")]
    pub max_session_permit: usize,

    /// Capacity of the bounded work queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Per-domain rate limiting and backoff
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    #[serde(rename = "base-delay-min-ms", default = "default_base_delay_min")]
    pub base_delay_min_ms: u64,

    #[serde(rename = "base-delay-max-ms", default = "default_base_delay_max")]
    pub base_delay_max_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Retries of a single fetch before it is recorded as failed
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// HTTP status codes treated as a rate limit signal
    #[serde(rename = "rate-limit-codes", default = "default_rate_limit_codes")]
    pub rate_limit_codes: Vec<u16>,
}

/// How the crawler monitor reports progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Log every task transition plus periodic totals
    #[default]
    Detailed,
    /// Periodic totals only
    Aggregated,
}

/// Progress monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(rename = "display-mode", default)]
    pub display_mode: DisplayMode,

    #[serde(rename = "report-interval-ms", default = "default_report_interval")]
    pub report_interval_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// JSON file holding the collected job listings
    #[serde(rename = "listings-path")]
    pub listings_path: String,

    /// CSV ledger of processed job ads
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            container_selector: default_container_selector(),
            detail_schema: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            apply_chunking: true,
            chunk_token_threshold: default_chunk_threshold(),
            overlap_rate: default_overlap_rate(),
            instruction: default_instruction(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            memory_threshold_percent: default_memory_threshold(),
            check_interval_ms: default_check_interval(),
            memory_wait_timeout_ms: default_memory_wait_timeout(),
            max_session_permit: default_max_session_permit(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            base_delay_min_ms: default_base_delay_min(),
            base_delay_max_ms: default_base_delay_max(),
            max_delay_ms: default_max_delay(),
            max_retries: default_max_retries(),
            rate_limit_codes: default_rate_limit_codes(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            display_mode: DisplayMode::default(),
            report_interval_ms: default_report_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    200
}

fn default_container_selector() -> String {
    "#job_ad".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_chunk_threshold() -> usize {
    1200
}

fn default_overlap_rate() -> f64 {
    0.1
}

fn default_instruction() -> String {
    DEFAULT_LLM_INSTRUCTION.to_string()
}

fn default_memory_threshold() -> f64 {
    80.0
}

fn default_check_interval() -> u64 {
    1000
}

fn default_memory_wait_timeout() -> u64 {
    600_000
}

fn default_max_session_permit() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    100
}

fn default_base_delay_min() -> u64 {
    1000
}

fn default_base_delay_max() -> u64 {
    2000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit_codes() -> Vec<u16> {
    vec![429, 503]
}

fn default_report_interval() -> u64 {
    5000
}

/// Result rows of the it-jobbank.dk search page
pub fn default_listing_schema() -> ExtractionSchema {
    ExtractionSchema {
        name: "Job Ads Extraction".to_string(),
        base_selector: "div.jobsearch-result".to_string(),
        fields: vec![
            FieldSpec::attribute("detail_url", "a[href*='/jobannonce/']", "href"),
            FieldSpec::new("job_title", ".job-title", FieldKind::Text),
            FieldSpec::new("company", ".job-company", FieldKind::Text),
            FieldSpec::new("location", ".job-location", FieldKind::Text),
        ],
    }
}

/// "Next" button of the it-jobbank.dk pager
pub fn default_pagination_schema() -> ExtractionSchema {
    ExtractionSchema {
        name: "Pagination Extraction".to_string(),
        base_selector: "li.page-item.page-item-next".to_string(),
        fields: vec![FieldSpec::attribute("next_page", "a", "href")],
    }
}
