//! Per-domain rate limiting with exponential backoff
//!
//! Every domain keeps its own delay between requests. A rate-limit response
//! doubles the delay (with jitter) up to a ceiling; successful responses let
//! it decay back towards a random value in the base range.

use crate::config::RateLimiterConfig;
use crate::state::DomainState;
use crate::url::domain_of;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Shared rate limiter keyed by domain
#[derive(Debug)]
pub struct RateLimiter {
    domains: Mutex<HashMap<String, DomainState>>,
    base_delay_min: Duration,
    base_delay_max: Duration,
    max_delay: Duration,
    max_retries: u32,
    rate_limit_codes: Vec<u16>,
}

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
            base_delay_min: Duration::from_millis(config.base_delay_min_ms),
            base_delay_max: Duration::from_millis(config.base_delay_max_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_retries: config.max_retries,
            rate_limit_codes: config.rate_limit_codes.clone(),
        }
    }

    /// Retries allowed for a single fetch
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns true if `status` signals a rate limit
    pub fn is_rate_limited(&self, status: u16) -> bool {
        self.rate_limit_codes.contains(&status)
    }

    /// Waits until a request to the URL's domain is allowed
    ///
    /// The slot is reserved before sleeping, so concurrent callers for the
    /// same domain queue up one delay apart.
    pub async fn wait_if_needed(&self, url: &str) {
        let domain = domain_of(url);
        let wait = {
            let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
            let initial = self.base_delay();
            let state = domains
                .entry(domain.clone())
                .or_insert_with(|| DomainState::new(initial));

            let now = Instant::now();
            let wait = state.time_until_next_request(now).unwrap_or(Duration::ZERO);
            state.record_request(now + wait);
            wait
        };

        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before next request to {}", wait, domain);
            tokio::time::sleep(wait).await;
        }
    }

    /// Grows the delay of the URL's domain after a rate-limit response
    ///
    /// # Returns
    ///
    /// The new delay of the domain
    pub fn back_off(&self, url: &str) -> Duration {
        let domain = domain_of(url);
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let initial = self.base_delay();
        let state = domains
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(initial));

        let delay = state.back_off(0.75 + fastrand::f64() * 0.5, self.max_delay);
        tracing::debug!(
            "Rate limited by {} ({} in a row), delay now {:?}",
            domain,
            state.fail_count,
            delay
        );
        delay
    }

    /// Lets the delay of the URL's domain decay after a successful response
    pub fn record_success(&self, url: &str) {
        let floor = self.base_delay();
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = domains.get_mut(&domain_of(url)) {
            state.recover(floor);
        }
    }

    /// Current delay of a domain, if it has been seen
    pub fn current_delay(&self, url: &str) -> Option<Duration> {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.get(&domain_of(url)).map(|s| s.current_delay)
    }

    /// Random delay in the base range
    fn base_delay(&self) -> Duration {
        let min = self.base_delay_min.as_millis() as u64;
        let max = self.base_delay_max.as_millis() as u64;
        if max <= min {
            return self.base_delay_min;
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }
}
