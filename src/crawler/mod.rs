//! Crawler module for page fetching and bulk dispatch
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with extraction strategies
//! - Walking paginated search results
//! - Memory-gated, rate-limited bulk dispatch with retries
//! - Overall pipeline coordination

mod coordinator;
mod dispatcher;
mod fetcher;
mod memory;
mod monitor;
mod paginator;
mod rate_limiter;

pub use coordinator::{run_pipeline, Coordinator, RunMode};
pub use dispatcher::Dispatcher;
pub use fetcher::{build_http_client, user_agent_string, FetchResult, HttpCrawler, PageCrawler, RunConfig};
pub use memory::{MemoryGate, MemoryProbe, SystemMemory};
pub use monitor::{CrawlerMonitor, MonitorSnapshot};
pub use paginator::Paginator;
pub use rate_limiter::RateLimiter;
