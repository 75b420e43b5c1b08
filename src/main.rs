//! Jobbank-Leads main entry point
//!
//! This is the command-line interface for the Jobbank-Leads contact harvester.

use clap::Parser;
use jobbank_leads::config::{load_config_with_hash, Config, StrategyKind};
use jobbank_leads::crawler::{run_pipeline, user_agent_string, RunMode};
use jobbank_leads::output::{load_ledger_statistics, print_ledger_statistics, print_summary};
use jobbank_leads::storage::CsvLedger;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Jobbank-Leads: a job listing contact harvester
///
/// Walks the search results of a job listing site, visits every job ad not
/// yet recorded in the CSV ledger and appends the contact persons found in it.
#[derive(Parser, Debug)]
#[command(name = "jobbank-leads")]
#[command(version)]
#[command(about = "A job listing contact harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only collect job listings and write the listings file
    #[arg(long, conflicts_with_all = ["contacts_only", "dry_run", "stats"])]
    listings_only: bool,

    /// Only extract contacts for the listings in the listings file
    #[arg(long, conflicts_with_all = ["listings_only", "dry_run", "stats"])]
    contacts_only: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["listings_only", "contacts_only", "stats"])]
    dry_run: bool,

    /// Show statistics of the ledger and exit
    #[arg(long, conflicts_with_all = ["listings_only", "contacts_only", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // API keys may live in a .env file next to the config
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.stats {
        return handle_stats(&config);
    }

    let mode = if cli.listings_only {
        RunMode::ListingsOnly
    } else if cli.contacts_only {
        RunMode::ContactsOnly
    } else {
        RunMode::Full
    };

    handle_run(config, mode).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobbank_leads=info,warn"),
            1 => EnvFilter::new("jobbank_leads=debug,info"),
            2 => EnvFilter::new("jobbank_leads=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Jobbank-Leads Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!("  Max pages: {}", config.site.max_pages);
    println!("  Cache mode: {:?}", config.site.cache_mode);
    println!(
        "  Listing schema: {} ({} fields)",
        config.site.listing_schema.base_selector,
        config.site.listing_schema.fields.len()
    );
    println!(
        "  Pagination schema: {}",
        config.site.pagination_schema.base_selector
    );

    println!("\nExtraction:");
    println!("  Strategy: {:?}", config.extraction.strategy);
    match config.extraction.strategy {
        StrategyKind::Llm => {
            let key_set = std::env::var(&config.llm.api_key_env).is_ok();
            println!("  Model: {} at {}", config.llm.model, config.llm.api_base);
            println!(
                "  API key ({}): {}",
                config.llm.api_key_env,
                if key_set { "set" } else { "NOT SET" }
            );
            println!(
                "  Chunking: {} ({} words, {:.0}% overlap)",
                config.llm.apply_chunking,
                config.llm.chunk_token_threshold,
                config.llm.overlap_rate * 100.0
            );
        }
        StrategyKind::Regex | StrategyKind::Schema => {
            println!("  Container: {}", config.extraction.container_selector);
        }
    }

    println!("\nDispatcher:");
    println!(
        "  Memory threshold: {:.1}% (checked every {}ms)",
        config.dispatcher.memory_threshold_percent, config.dispatcher.check_interval_ms
    );
    println!("  Max concurrent fetches: {}", config.dispatcher.max_session_permit);
    println!(
        "  Rate limiter: {}-{}ms base, {}ms max, {} retries on {:?}",
        config.rate_limiter.base_delay_min_ms,
        config.rate_limiter.base_delay_max_ms,
        config.rate_limiter.max_delay_ms,
        config.rate_limiter.max_retries,
        config.rate_limiter.rate_limit_codes
    );

    println!("\nUser Agent: {}", user_agent_string(&config.user_agent));

    println!("\nOutput:");
    println!("  Listings: {}", config.output.listings_path);
    println!("  Ledger: {}", config.output.ledger_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the ledger
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Ledger: {}\n", config.output.ledger_path);

    let ledger = CsvLedger::new(&config.output.ledger_path);
    let stats = load_ledger_statistics(&ledger)?;
    print_ledger_statistics(&stats);

    Ok(())
}

/// Handles the pipeline run
async fn handle_run(config: Config, mode: RunMode) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting run ({:?})", mode);

    match run_pipeline(config, mode).await {
        Ok(summary) => {
            tracing::info!("Run completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
