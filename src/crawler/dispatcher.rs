//! Bulk fetch dispatcher
//!
//! URLs flow through a bounded work queue into an admission loop. Each fetch
//! is admitted once the memory gate reports headroom and a semaphore permit is
//! free, then runs as its own task. Rate-limited fetches and network errors
//! are retried with the per-domain backoff of the [`RateLimiter`]. Results come back over a channel,
//! one per URL, in completion order.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, PageCrawler, RunConfig};
use crate::crawler::memory::{MemoryGate, MemoryProbe, SystemMemory};
use crate::crawler::monitor::CrawlerMonitor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::state::TaskState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Issues many fetches under memory, concurrency and rate limits
pub struct Dispatcher {
    crawler: Arc<dyn PageCrawler>,
    gate: MemoryGate,
    max_session_permit: usize,
    queue_capacity: usize,
    rate_limiter: Arc<RateLimiter>,
    monitor: Arc<CrawlerMonitor>,
    report_interval: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher reading system memory through `sysinfo`
    pub fn new(crawler: Arc<dyn PageCrawler>, config: &Config) -> Self {
        Self::with_memory_probe(crawler, config, Arc::new(SystemMemory::new()))
    }

    /// Creates a dispatcher with a custom memory probe
    pub fn with_memory_probe(
        crawler: Arc<dyn PageCrawler>,
        config: &Config,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let dispatcher = &config.dispatcher;
        let gate = MemoryGate::new(
            probe,
            dispatcher.memory_threshold_percent,
            Duration::from_millis(dispatcher.check_interval_ms),
            Duration::from_millis(dispatcher.memory_wait_timeout_ms),
        );

        Self {
            crawler,
            gate,
            max_session_permit: dispatcher.max_session_permit.max(1),
            queue_capacity: dispatcher.queue_capacity.max(1),
            rate_limiter: Arc::new(RateLimiter::new(&config.rate_limiter)),
            monitor: Arc::new(CrawlerMonitor::from_config(&config.monitor)),
            report_interval: config
                .monitor
                .enabled
                .then(|| Duration::from_millis(config.monitor.report_interval_ms.max(1))),
        }
    }

    pub fn monitor(&self) -> Arc<CrawlerMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Shares a rate limiter with other stages of the run
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Fetches every URL and returns one result per URL, in any order
    ///
    /// # Arguments
    ///
    /// * `urls` - The work order
    /// * `run_config` - Cache mode and extraction strategy applied to every URL
    ///
    /// # Returns
    ///
    /// One [`FetchResult`] per URL. A fetch task that panics yields a failed
    /// result for its URL.
    pub async fn dispatch(&self, urls: Vec<String>, run_config: &RunConfig) -> Vec<FetchResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let total = urls.len();
        tracing::info!(
            "Dispatching {} fetches ({} concurrent, {} strategy)",
            total,
            self.max_session_permit,
            run_config.strategy.name()
        );

        let (work_tx, mut work_rx) = mpsc::channel::<String>(self.queue_capacity);
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<FetchResult>();

        let producer_monitor = Arc::clone(&self.monitor);
        let producer = tokio::spawn(async move {
            for url in urls {
                producer_monitor.transition(&url, TaskState::Queued);
                if work_tx.send(url).await.is_err() {
                    break;
                }
            }
        });

        let reporter = self
            .report_interval
            .map(|interval| CrawlerMonitor::spawn_reporter(Arc::clone(&self.monitor), interval));

        let semaphore = Arc::new(Semaphore::new(self.max_session_permit));
        let run_config = Arc::new(run_config.clone());

        while let Some(url) = work_rx.recv().await {
            self.gate.wait_for_headroom().await;

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            self.monitor.transition(&url, TaskState::Running);

            let fetch = tokio::spawn(fetch_with_retry(
                Arc::clone(&self.crawler),
                Arc::clone(&self.rate_limiter),
                Arc::clone(&self.monitor),
                url.clone(),
                Arc::clone(&run_config),
            ));

            let monitor = Arc::clone(&self.monitor);
            let results = result_tx.clone();
            tokio::spawn(async move {
                let result = match fetch.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Fetch task for {} aborted: {}", url, e);
                        FetchResult::failure(&url, format!("fetch task aborted: {}", e), None)
                    }
                };
                drop(permit);

                let state = if result.success {
                    TaskState::Completed
                } else {
                    tracing::warn!(
                        "Failed {}: {}",
                        result.url,
                        result.error_message.as_deref().unwrap_or("unknown error")
                    );
                    TaskState::Failed
                };
                monitor.transition(&result.url, state);
                let _ = results.send(result);
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        let _ = producer.await;
        if let Some(reporter) = reporter {
            reporter.abort();
        }
        self.monitor.report();

        results
    }
}

/// Fetches one URL, retrying rate-limit responses and network errors
async fn fetch_with_retry(
    crawler: Arc<dyn PageCrawler>,
    rate_limiter: Arc<RateLimiter>,
    monitor: Arc<CrawlerMonitor>,
    url: String,
    run_config: Arc<RunConfig>,
) -> FetchResult {
    let mut retries = 0;

    loop {
        rate_limiter.wait_if_needed(&url).await;
        let mut result = crawler.crawl(&url, &run_config).await;
        result.retries = retries;

        let rate_limited = !result.success
            && result
                .status_code
                .is_some_and(|code| rate_limiter.is_rate_limited(code));

        if !(rate_limited || (result.transient && !result.success)) {
            if result.success {
                rate_limiter.record_success(&url);
            }
            return result;
        }

        let delay = rate_limiter.back_off(&url);
        if retries >= rate_limiter.max_retries() {
            let reason = if rate_limited {
                format!("rate limited (HTTP {})", result.status_code.unwrap_or_default())
            } else {
                result.error_message.clone().unwrap_or_else(|| "network error".to_string())
            };
            result.error_message = Some(format!("{} after {} retries", reason, retries));
            return result;
        }

        retries += 1;
        monitor.transition(&url, TaskState::Retrying);
        tracing::debug!(
            "Retrying {} in {:?} (attempt {}): {}",
            url,
            delay,
            retries + 1,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }
}
