//! Pagination walker
//!
//! Walks the search results page by page. Each page is extracted twice: once
//! with the listing schema for the job rows and once with the pagination
//! schema for the "next" link. The walk ends when a page fails, no next link
//! is found, a next link points back to a visited page, or the page limit is
//! reached. Requests go through the shared [`RateLimiter`] so result pages
//! keep the same per-domain spacing as job ads.

use crate::config::SiteConfig;
use crate::config::CacheMode;
use crate::crawler::fetcher::{FetchResult, PageCrawler, RunConfig};
use crate::crawler::rate_limiter::RateLimiter;
use crate::extraction::ExtractionStrategy;
use crate::storage::JobListing;
use crate::url::{parse_http_url, resolve_href};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Sequential walker over paginated search results
pub struct Paginator {
    crawler: Arc<dyn PageCrawler>,
    rate_limiter: Arc<RateLimiter>,
    listing: RunConfig,
    pagination: RunConfig,
    max_pages: u32,
}

impl Paginator {
    pub fn new(crawler: Arc<dyn PageCrawler>, site: &SiteConfig, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            crawler,
            rate_limiter,
            listing: RunConfig::new(
                site.cache_mode,
                ExtractionStrategy::Schema(site.listing_schema.clone()),
            ),
            pagination: RunConfig::new(
                site.cache_mode,
                ExtractionStrategy::Schema(site.pagination_schema.clone()),
            ),
            max_pages: site.max_pages,
        }
    }

    /// Collects the job listings of every page reachable from `start_url`
    ///
    /// Failures end the walk; the listings collected so far are returned.
    pub async fn walk(&self, start_url: &str) -> Vec<JobListing> {
        let mut listings = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(start_url.to_string());
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= self.max_pages {
                tracing::warn!("Reached the limit of {} pages, stopping at {}", self.max_pages, url);
                break;
            }
            if !visited.insert(url.clone()) {
                tracing::warn!("Next page {} was already visited, stopping", url);
                break;
            }
            pages += 1;

            let base = match parse_http_url(&url) {
                Ok(base) => base,
                Err(e) => {
                    tracing::error!("Invalid page URL {}: {}", url, e);
                    break;
                }
            };

            tracing::info!("Fetching page {}: {}", pages, url);
            self.rate_limiter.wait_if_needed(&url).await;
            let result = self.crawler.crawl(&url, &self.listing).await;
            if !result.success {
                tracing::error!(
                    "Failed to fetch page {}: {}",
                    url,
                    result.error_message.as_deref().unwrap_or("unknown error")
                );
                break;
            }

            self.rate_limiter.record_success(&url);

            let page_listings = listings_from_result(&result, &base);
            tracing::info!("Found {} job listings on page {}", page_listings.len(), pages);
            listings.extend(page_listings);

            // With the cache enabled the second extraction does not hit the site
            if self.pagination.cache_mode != CacheMode::Enabled {
                self.rate_limiter.wait_if_needed(&url).await;
            }
            let pager = self.crawler.crawl(&url, &self.pagination).await;
            next = next_page_url(&pager, &base);
            if next.is_none() {
                tracing::info!("No next page found, pagination finished after {} pages", pages);
            }
        }

        listings
    }
}

/// Turns listing schema records into job listings with absolute URLs
fn listings_from_result(result: &FetchResult, base: &Url) -> Vec<JobListing> {
    let Some(payload) = &result.payload else {
        return Vec::new();
    };

    payload
        .records()
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| {
            let href = text_field(record, "detail_url");
            match resolve_href(&href, base) {
                Ok(detail_url) => Some(JobListing {
                    detail_url,
                    job_title: text_field(record, "job_title"),
                    company: text_field(record, "company"),
                    location: text_field(record, "location"),
                }),
                Err(e) => {
                    tracing::debug!("Dropping listing row without usable detail_url ({})", e);
                    None
                }
            }
        })
        .collect()
}

/// The first `next_page` link of a pagination result, resolved against the page
fn next_page_url(result: &FetchResult, base: &Url) -> Option<String> {
    if !result.success {
        tracing::warn!(
            "Pagination extraction failed for {}: {}",
            result.url,
            result.error_message.as_deref().unwrap_or("unknown error")
        );
        return None;
    }

    result
        .payload
        .as_ref()?
        .records()
        .iter()
        .filter_map(Value::as_object)
        .map(|record| text_field(record, "next_page"))
        .find_map(|href| resolve_href(&href, base).ok())
}

fn text_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_listing_schema, default_pagination_schema, RateLimiterConfig};
    use crate::extraction::ExtractedPayload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned listing rows and next links per page URL
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, (Vec<Value>, Option<String>)>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, rows: Vec<Value>, next: Option<&str>) -> Self {
            self.pages
                .insert(url.to_string(), (rows, next.map(str::to_string)));
            self
        }
    }

    fn as_records(values: Vec<Value>) -> ExtractedPayload {
        ExtractedPayload::Schema(
            values
                .into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
        )
    }

    #[async_trait]
    impl PageCrawler for FakeSite {
        async fn crawl(&self, url: &str, config: &RunConfig) -> FetchResult {
            self.requests.lock().unwrap().push(url.to_string());
            let Some((rows, next)) = self.pages.get(url) else {
                return FetchResult::failure(url, "HTTP 404 Not Found", Some(404));
            };

            let is_pager = matches!(
                &config.strategy,
                ExtractionStrategy::Schema(schema) if schema.name == "Pagination Extraction"
            );
            let payload = if is_pager {
                as_records(next.iter().map(|n| json!({ "next_page": n })).collect())
            } else {
                as_records(rows.clone())
            };
            FetchResult::success(url, payload, Some(200))
        }
    }

    fn site(max_pages: u32) -> SiteConfig {
        SiteConfig {
            start_url: "https://jobs.dk/search".to_string(),
            max_pages,
            cache_mode: CacheMode::Bypass,
            listing_schema: default_listing_schema(),
            pagination_schema: default_pagination_schema(),
        }
    }

    fn limiter(delay_ms: u64) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(&RateLimiterConfig {
            base_delay_min_ms: delay_ms,
            base_delay_max_ms: delay_ms,
            max_delay_ms: delay_ms.max(1) * 10,
            max_retries: 0,
            rate_limit_codes: vec![429],
        }))
    }

    fn walker(crawler: Arc<dyn PageCrawler>, max_pages: u32) -> Paginator {
        Paginator::new(crawler, &site(max_pages), limiter(0))
    }

    fn row(href: &str, title: &str) -> Value {
        json!({ "detail_url": href, "job_title": format!("  {}  ", title), "company": "Acme" })
    }

    #[tokio::test]
    async fn test_walks_finite_chain() {
        let fake = FakeSite::default()
            .page("https://jobs.dk/search", vec![row("/job/1", "A"), row("/job/2", "B")], Some("/search?page=2"))
            .page("https://jobs.dk/search?page=2", vec![row("/job/3", "C")], Some("?page=3"))
            .page("https://jobs.dk/search?page=3", vec![row("https://other.dk/job/4", "D")], None);

        let listings = walker(Arc::new(fake), 200)
            .walk("https://jobs.dk/search")
            .await;

        let urls: Vec<&str> = listings.iter().map(|l| l.detail_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://jobs.dk/job/1",
                "https://jobs.dk/job/2",
                "https://jobs.dk/job/3",
                "https://other.dk/job/4",
            ]
        );
        assert_eq!(listings[0].job_title, "A");
        assert_eq!(listings[0].location, "");
    }

    #[tokio::test]
    async fn test_failed_page_returns_partial_results() {
        let fake = FakeSite::default().page(
            "https://jobs.dk/search",
            vec![row("/job/1", "A")],
            Some("/search?page=2"),
        );

        let listings = walker(Arc::new(fake), 200)
            .walk("https://jobs.dk/search")
            .await;
        assert_eq!(listings.len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_stops_walk() {
        let fake = Arc::new(
            FakeSite::default()
                .page("https://jobs.dk/a", vec![row("/job/1", "A")], Some("/b"))
                .page("https://jobs.dk/b", vec![row("/job/2", "B")], Some("/a")),
        );

        let listings = walker(fake.clone(), 200)
            .walk("https://jobs.dk/a")
            .await;

        assert_eq!(listings.len(), 2);
        // Two extractions per page, no third page
        assert_eq!(fake.requests.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_max_pages_bound() {
        let fake = FakeSite::default()
            .page("https://jobs.dk/1", vec![row("/job/1", "A")], Some("/2"))
            .page("https://jobs.dk/2", vec![row("/job/2", "B")], Some("/3"))
            .page("https://jobs.dk/3", vec![row("/job/3", "C")], None);

        let listings = walker(Arc::new(fake), 2)
            .walk("https://jobs.dk/1")
            .await;
        assert_eq!(listings.len(), 2);
    }

    #[tokio::test]
    async fn test_rows_without_detail_url_dropped() {
        let fake = FakeSite::default().page(
            "https://jobs.dk/search",
            vec![json!({ "job_title": "No link" }), row("/job/9", "Z")],
            None,
        );

        let listings = walker(Arc::new(fake), 200)
            .walk("https://jobs.dk/search")
            .await;
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].detail_url, "https://jobs.dk/job/9");
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_rate_limiter() {
        let fake = FakeSite::default()
            .page("https://jobs.dk/1", vec![row("/job/1", "A")], Some("/2"))
            .page("https://jobs.dk/2", vec![row("/job/2", "B")], None);

        let started = std::time::Instant::now();
        let listings = Paginator::new(Arc::new(fake), &site(200), limiter(40))
            .walk("https://jobs.dk/1")
            .await;

        assert_eq!(listings.len(), 2);
        // Four requests to one domain: the first is immediate, three wait
        assert!(started.elapsed() >= std::time::Duration::from_millis(110));
    }
}
