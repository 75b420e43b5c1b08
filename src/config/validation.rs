use crate::config::types::{
    Config, DispatcherConfig, ExtractionConfig, LlmConfig, OutputConfig, RateLimiterConfig,
    SiteConfig, StrategyKind, UserAgentConfig,
};
use crate::extraction::{ExtractionSchema, FieldKind};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_extraction_config(&config.extraction)?;
    validate_llm_config(&config.llm)?;
    validate_dispatcher_config(&config.dispatcher)?;
    validate_rate_limiter_config(&config.rate_limiter)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the listing site settings and both schemas
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url must use http or https, got '{}'",
            config.start_url
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    validate_schema(&config.listing_schema)?;
    require_field(&config.listing_schema, "detail_url")?;

    validate_schema(&config.pagination_schema)?;
    require_field(&config.pagination_schema, "next_page")?;

    Ok(())
}

/// Validates detail page extraction settings
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_selector(&config.container_selector)?;

    match (&config.strategy, &config.detail_schema) {
        (StrategyKind::Schema, None) => Err(ConfigError::Validation(
            "strategy 'schema' requires an [extraction.detail-schema] table".to_string(),
        )),
        (_, Some(schema)) => validate_schema(schema),
        _ => Ok(()),
    }
}

/// Validates LLM settings
fn validate_llm_config(config: &LlmConfig) -> Result<(), ConfigError> {
    if config.model.is_empty() {
        return Err(ConfigError::Validation("llm model cannot be empty".to_string()));
    }

    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.chunk_token_threshold < 1 {
        return Err(ConfigError::Validation(
            "chunk_token_threshold must be >= 1".to_string(),
        ));
    }

    if !(0.0..1.0).contains(&config.overlap_rate) {
        return Err(ConfigError::Validation(format!(
            "overlap_rate must be in [0, 1), got {}",
            config.overlap_rate
        )));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    Ok(())
}

/// Validates dispatcher limits
fn validate_dispatcher_config(config: &DispatcherConfig) -> Result<(), ConfigError> {
    if !(config.memory_threshold_percent > 0.0 && config.memory_threshold_percent <= 100.0) {
        return Err(ConfigError::Validation(format!(
            "memory_threshold_percent must be in (0, 100], got {}",
            config.memory_threshold_percent
        )));
    }

    if config.check_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "check_interval_ms must be >= 10ms, got {}ms",
            config.check_interval_ms
        )));
    }

    if config.max_session_permit < 1 || config.max_session_permit > 100 {
        return Err(ConfigError::Validation(format!(
            "max_session_permit must be between 1 and 100, got {}",
            config.max_session_permit
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the backoff window
fn validate_rate_limiter_config(config: &RateLimiterConfig) -> Result<(), ConfigError> {
    if config.base_delay_min_ms > config.base_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_min_ms ({}) must not exceed base_delay_max_ms ({})",
            config.base_delay_min_ms, config.base_delay_max_ms
        )));
    }

    if config.base_delay_max_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_max_ms ({}) must not exceed max_delay_ms ({})",
            config.base_delay_max_ms, config.max_delay_ms
        )));
    }

    for code in &config.rate_limit_codes {
        if !(100..=599).contains(code) {
            return Err(ConfigError::Validation(format!(
                "rate_limit_codes contains invalid HTTP status {}",
                code
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.listings_path.is_empty() {
        return Err(ConfigError::Validation(
            "listings_path cannot be empty".to_string(),
        ));
    }

    if config.ledger_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates an extraction schema and every selector in it
fn validate_schema(schema: &ExtractionSchema) -> Result<(), ConfigError> {
    if schema.base_selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Schema '{}' must have a base selector",
            schema.name
        )));
    }
    validate_selector(&schema.base_selector)?;

    if schema.fields.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Schema '{}' must have at least one field",
            schema.name
        )));
    }

    for field in &schema.fields {
        if field.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Schema '{}' has a field without a name",
                schema.name
            )));
        }

        validate_selector(&field.selector)?;

        if field.kind == FieldKind::Attribute
            && field.attribute.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Validation(format!(
                "Field '{}' in schema '{}' is an attribute field but names no attribute",
                field.name, schema.name
            )));
        }
    }

    Ok(())
}

fn require_field(schema: &ExtractionSchema, name: &str) -> Result<(), ConfigError> {
    if schema.fields.iter().any(|f| f.name == name) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "Schema '{}' must define a '{}' field",
            schema.name, name
        )))
    }
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
