//! Pipeline coordinator - main run orchestration logic
//!
//! A full run has two stages:
//! - collecting job listings by walking the paginated search results
//! - extracting contacts from every job ad not yet in the ledger
//!
//! Either stage can run on its own; the listings file connects them.

use crate::config::{CacheMode, Config, StrategyKind};
use crate::crawler::dispatcher::Dispatcher;
use crate::crawler::fetcher::{HttpCrawler, PageCrawler, RunConfig};
use crate::crawler::memory::{MemoryProbe, SystemMemory};
use crate::crawler::paginator::Paginator;
use crate::crawler::rate_limiter::RateLimiter;
use crate::extraction::{ExtractionStrategy, LlmClient, LlmStrategy, RegexStrategy};
use crate::output::{merge, RunSummary};
use crate::storage::{filter_new_listings, load_listings, save_listings, CsvLedger, JobListing};
use crate::{ConfigError, LeadsError};
use std::path::Path;
use std::sync::Arc;

/// Which stages of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Collect listings, then extract contacts
    #[default]
    Full,
    /// Collect listings and write the listings file
    ListingsOnly,
    /// Extract contacts for the listings in the listings file
    ContactsOnly,
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Config,
    crawler: Arc<dyn PageCrawler>,
    llm_ready: bool,
    memory_probe: Arc<dyn MemoryProbe>,
    rate_limiter: Arc<RateLimiter>,
}

impl Coordinator {
    /// Creates a coordinator with an HTTP crawler
    ///
    /// The LLM client is built when the API key variable is set. A missing
    /// key only becomes an error once the LLM strategy is needed.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LeadsError)` - The HTTP clients could not be built
    pub fn new(config: Config) -> Result<Self, LeadsError> {
        let llm = LlmClient::from_config(&config.llm)?;
        let llm_ready = llm.is_some();
        if !llm_ready && config.extraction.strategy == StrategyKind::Llm {
            tracing::warn!(
                "{} is not set; contact extraction will fail if there are new job ads",
                config.llm.api_key_env
            );
        }

        let crawler = HttpCrawler::new(&config.user_agent, llm)?;
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limiter));

        Ok(Self {
            config,
            crawler: Arc::new(crawler),
            llm_ready,
            memory_probe: Arc::new(SystemMemory::new()),
            rate_limiter,
        })
    }

    /// Creates a coordinator around an existing crawler
    ///
    /// The crawler is trusted to handle every strategy, including LLM extraction.
    pub fn with_crawler(config: Config, crawler: Arc<dyn PageCrawler>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limiter));
        Self {
            config,
            crawler,
            llm_ready: true,
            memory_probe: Arc::new(SystemMemory::new()),
            rate_limiter,
        }
    }

    /// Replaces the system memory probe used by the dispatcher
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = probe;
        self
    }

    /// Runs the selected stages
    pub async fn run(&self, mode: RunMode) -> Result<RunSummary, LeadsError> {
        let mut summary = RunSummary::start();

        let listings = match mode {
            RunMode::Full | RunMode::ListingsOnly => self.collect_listings().await?,
            RunMode::ContactsOnly => {
                load_listings(Path::new(&self.config.output.listings_path))?
            }
        };
        summary.listings_discovered = listings.len();

        if mode != RunMode::ListingsOnly {
            self.extract_contacts(listings, &mut summary).await?;
        }

        summary.finish();
        Ok(summary)
    }

    /// Walks the search results and writes the listings file
    pub async fn collect_listings(&self) -> Result<Vec<JobListing>, LeadsError> {
        let site = &self.config.site;
        tracing::info!("Collecting job listings from {}", site.start_url);

        let paginator = Paginator::new(
            Arc::clone(&self.crawler),
            site,
            Arc::clone(&self.rate_limiter),
        );
        let listings = paginator.walk(&site.start_url).await;
        tracing::info!("Collected {} job listings", listings.len());

        save_listings(Path::new(&self.config.output.listings_path), &listings)?;
        Ok(listings)
    }

    /// Extracts contacts for new listings and appends them to the ledger
    ///
    /// # Arguments
    ///
    /// * `listings` - Listings to consider; those already in the ledger are skipped
    /// * `summary` - Receives the counts of this stage
    pub async fn extract_contacts(
        &self,
        listings: Vec<JobListing>,
        summary: &mut RunSummary,
    ) -> Result<(), LeadsError> {
        let ledger = CsvLedger::new(&self.config.output.ledger_path);
        let seen = ledger.load_seen()?;
        tracing::info!("{} job ads already recorded in {}", seen.len(), ledger.path().display());

        let total = listings.len();
        let work = filter_new_listings(listings, &seen);
        summary.skipped_duplicates = total - work.len();

        if work.is_empty() {
            tracing::info!("No new job ads found");
            return Ok(());
        }
        tracing::info!("Processing {} new job ads", work.len());

        let run_config = RunConfig::new(CacheMode::Bypass, self.detail_strategy()?);
        let dispatcher = Dispatcher::with_memory_probe(
            Arc::clone(&self.crawler),
            &self.config,
            Arc::clone(&self.memory_probe),
        )
        .with_rate_limiter(Arc::clone(&self.rate_limiter));

        let urls: Vec<String> = work.keys().cloned().collect();
        summary.dispatched = urls.len();
        let results = dispatcher.dispatch(urls, &run_config).await;

        let report = merge(&results, &work);
        summary.failed = report.failed;
        summary.rejected_contacts = report.rejected_contacts;
        summary.rows_written = ledger.append(&report.rows)?;

        tracing::info!(
            "Wrote {} new rows ({} failed, {} placeholder contacts rejected)",
            summary.rows_written,
            report.failed,
            report.rejected_contacts
        );
        Ok(())
    }

    /// Strategy applied to job detail pages
    fn detail_strategy(&self) -> Result<ExtractionStrategy, LeadsError> {
        let extraction = &self.config.extraction;

        match extraction.strategy {
            StrategyKind::Llm => {
                if !self.llm_ready {
                    return Err(ConfigError::MissingEnv(self.config.llm.api_key_env.clone()).into());
                }
                Ok(ExtractionStrategy::Llm(LlmStrategy::from_config(&self.config.llm, None)))
            }
            StrategyKind::Regex => Ok(ExtractionStrategy::Regex(RegexStrategy::new(Some(
                extraction.container_selector.clone(),
            )))),
            StrategyKind::Schema => extraction
                .detail_schema
                .clone()
                .map(ExtractionStrategy::Schema)
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "strategy 'schema' requires an [extraction.detail-schema] table".to_string(),
                    )
                    .into()
                }),
        }
    }
}

/// Runs the pipeline with the HTTP crawler
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `mode` - Which stages to run
///
/// # Returns
///
/// * `Ok(RunSummary)` - Totals of the run
/// * `Err(LeadsError)` - A structural failure stopped the run
pub async fn run_pipeline(config: Config, mode: RunMode) -> Result<RunSummary, LeadsError> {
    Coordinator::new(config)?.run(mode).await
}
