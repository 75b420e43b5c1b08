//! End-to-end runs of the pipeline with the regex strategy

use crate::common::{job_ad, listing_page, serve_page, test_config};
use jobbank_leads::config::CacheMode;
use jobbank_leads::crawler::{Coordinator, Dispatcher, HttpCrawler, RunConfig, RunMode};
use jobbank_leads::extraction::{ExtractionStrategy, RegexStrategy};
use jobbank_leads::storage::{load_listings, CsvLedger, StorageError, LEDGER_HEADER};
use jobbank_leads::LeadsError;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Two result pages with three job ads in total
async fn mount_site(server: &MockServer) {
    serve_page(
        server,
        "/jobsoegning",
        listing_page(
            &[
                ("/jobannonce/h1/backend", "Backend-udvikler", "Acme A/S"),
                ("/jobannonce/h2/frontend", "Frontend-udvikler", "Beta ApS"),
            ],
            Some("/jobsoegning/side-2"),
        ),
    )
    .await;
    serve_page(
        server,
        "/jobsoegning/side-2",
        listing_page(&[("/jobannonce/h3/devops", "DevOps", "Gamma")], None),
    )
    .await;
}

async fn mount_job(server: &MockServer, route: &str, text: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(job_ad(text)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_writes_ledger() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;
    mount_job(
        &server,
        "/jobannonce/h1/backend",
        "Spørgsmål? Ring til Mette Larsen - HR-partner, mette@acme.dk, tlf. 12 34 56 78",
    )
    .await;
    mount_job(&server, "/jobannonce/h2/frontend", "Søg via vores portal").await;
    mount_job(&server, "/jobannonce/h3/devops", "Skriv til jobs@gamma.dk").await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(RunMode::Full)
        .await
        .unwrap();

    assert_eq!(summary.listings_discovered, 3);
    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.failed, 0);

    let listings = load_listings(dir.path().join("job_urls.json").as_path()).unwrap();
    assert_eq!(listings.len(), 3);
    assert_eq!(listings[0].detail_url, format!("{}/jobannonce/h1/backend", server.uri()));
    assert_eq!(listings[0].job_title, "Backend-udvikler");

    let rows = CsvLedger::new(&config.output.ledger_path).load_rows().unwrap();
    assert_eq!(rows.len(), 3);

    let backend = rows
        .iter()
        .find(|r| r.detail_url.ends_with("/h1/backend"))
        .unwrap();
    assert_eq!(backend.company, "Acme A/S");
    assert_eq!(backend.contact_name1, "Mette Larsen");
    assert_eq!(backend.contact_title1, "HR-partner");
    assert_eq!(backend.contact_email1, "mette@acme.dk");
    assert_eq!(backend.contact_phone1, "12 34 56 78");

    let frontend = rows
        .iter()
        .find(|r| r.detail_url.ends_with("/h2/frontend"))
        .unwrap();
    assert!(!frontend.has_contact());
}

#[tokio::test]
async fn test_second_run_appends_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;
    // Each job ad may only be fetched once across both runs
    mount_job(&server, "/jobannonce/h1/backend", "Skriv til a@acme.dk").await;
    mount_job(&server, "/jobannonce/h2/frontend", "Skriv til b@beta.dk").await;
    mount_job(&server, "/jobannonce/h3/devops", "Skriv til c@gamma.dk").await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");

    let first = Coordinator::new(config.clone()).unwrap().run(RunMode::Full).await.unwrap();
    assert_eq!(first.rows_written, 3);

    let second = Coordinator::new(config.clone()).unwrap().run(RunMode::Full).await.unwrap();
    assert_eq!(second.listings_discovered, 3);
    assert_eq!(second.skipped_duplicates, 3);
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.rows_written, 0);

    let content = std::fs::read_to_string(&config.output.ledger_path).unwrap();
    assert_eq!(content.lines().count(), 4);
}

#[tokio::test]
async fn test_ledger_entries_are_not_dispatched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;
    mount_job(&server, "/jobannonce/h2/frontend", "Skriv til b@beta.dk").await;
    mount_job(&server, "/jobannonce/h3/devops", "Skriv til c@gamma.dk").await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");
    std::fs::write(
        &config.output.ledger_path,
        format!(
            "\u{feff}{}\n{}/jobannonce/h1/backend,Backend-udvikler,Acme A/S,København,,,,,,,,\n",
            LEDGER_HEADER.join(","),
            server.uri()
        ),
    )
    .unwrap();

    let summary = Coordinator::new(config.clone()).unwrap().run(RunMode::Full).await.unwrap();

    assert_eq!(summary.skipped_duplicates, 1);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.rows_written, 2);
}

#[tokio::test]
async fn test_failed_job_ad_yields_no_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;
    mount_job(&server, "/jobannonce/h1/backend", "Skriv til a@acme.dk").await;
    mount_job(&server, "/jobannonce/h3/devops", "Skriv til c@gamma.dk").await;
    Mock::given(method("GET"))
        .and(path("/jobannonce/h2/frontend"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");
    let summary = Coordinator::new(config.clone()).unwrap().run(RunMode::Full).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rows_written, 2);

    let seen = CsvLedger::new(&config.output.ledger_path).load_seen().unwrap();
    assert!(!seen.contains(&format!("{}/jobannonce/h2/frontend", server.uri())));
}

#[tokio::test]
async fn test_rate_limited_job_ad_is_retried_once() {
    let server = MockServer::start().await;
    let url = format!("{}/jobannonce/h1/backend", server.uri());

    Mock::given(method("GET"))
        .and(path("/jobannonce/h1/backend"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobannonce/h1/backend"))
        .respond_with(ResponseTemplate::new(200).set_body_string(job_ad("Skriv til a@acme.dk")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");
    let crawler = Arc::new(HttpCrawler::new(&config.user_agent, None).unwrap());
    let dispatcher = Dispatcher::new(crawler, &config);

    let run_config = RunConfig::new(
        CacheMode::Bypass,
        ExtractionStrategy::Regex(RegexStrategy::new(Some("#job_ad".to_string()))),
    );
    let results = dispatcher.dispatch(vec![url], &run_config).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].retries, 1);
    assert_eq!(dispatcher.monitor().snapshot().retries, 1);
    assert_eq!(
        results[0].payload.as_ref().unwrap().contacts()[0].email.as_deref(),
        Some("a@acme.dk")
    );
}

#[tokio::test]
async fn test_listings_only_then_contacts_only() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;
    mount_job(&server, "/jobannonce/h1/backend", "Skriv til a@acme.dk").await;
    mount_job(&server, "/jobannonce/h2/frontend", "Skriv til b@beta.dk").await;
    mount_job(&server, "/jobannonce/h3/devops", "Skriv til c@gamma.dk").await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");

    let listed = Coordinator::new(config.clone())
        .unwrap()
        .run(RunMode::ListingsOnly)
        .await
        .unwrap();
    assert_eq!(listed.listings_discovered, 3);
    assert_eq!(listed.rows_written, 0);
    assert!(!std::path::Path::new(&config.output.ledger_path).exists());

    let contacts = Coordinator::new(config.clone())
        .unwrap()
        .run(RunMode::ContactsOnly)
        .await
        .unwrap();
    assert_eq!(contacts.rows_written, 3);
}

#[tokio::test]
async fn test_contacts_only_without_listings_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = test_config("http://127.0.0.1:9", dir.path(), "regex", "UNUSED_KEY");

    let result = Coordinator::new(config).unwrap().run(RunMode::ContactsOnly).await;
    assert!(matches!(
        result,
        Err(LeadsError::Storage(StorageError::MissingInput(_)))
    ));
}

#[tokio::test]
async fn test_cyclic_pagination_stops() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    serve_page(
        &server,
        "/jobsoegning",
        listing_page(&[("/jobannonce/h1/a", "A", "Acme")], Some("/jobsoegning/side-2")),
    )
    .await;
    serve_page(
        &server,
        "/jobsoegning/side-2",
        listing_page(&[("/jobannonce/h2/b", "B", "Beta")], Some("/jobsoegning")),
    )
    .await;

    let config = test_config(&server.uri(), dir.path(), "regex", "UNUSED_KEY");
    let summary = Coordinator::new(config)
        .unwrap()
        .run(RunMode::ListingsOnly)
        .await
        .unwrap();

    assert_eq!(summary.listings_discovered, 2);
}
