//! Pipeline runs with the LLM strategy against a mocked chat completions API

use crate::common::{job_ad, listing_page, serve_page, test_config};
use jobbank_leads::crawler::{Coordinator, RunMode};
use jobbank_leads::storage::{save_listings, CsvLedger, JobListing};
use jobbank_leads::{ConfigError, LeadsError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_answer(contacts: serde_json::Value) -> ResponseTemplate {
    let body = json!({
        "choices": [
            { "message": { "role": "assistant", "content": json!({ "contacts": contacts }).to_string() } }
        ]
    });
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_single_job_site(server: &MockServer) {
    serve_page(
        server,
        "/jobsoegning",
        listing_page(&[("/jobannonce/u1/udvikler", "Udvikler", "Acme A/S")], None),
    )
    .await;
    serve_page(
        server,
        "/jobannonce/u1/udvikler",
        job_ad("Kontakt os for at høre mere om stillingen"),
    )
    .await;
}

#[tokio::test]
async fn test_llm_contacts_written_and_placeholders_rejected() {
    let key_env = "JOBBANK_LEADS_TEST_KEY_MERGE";
    std::env::set_var(key_env, "sk-test-merge");

    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_single_job_site(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-merge"))
        .respond_with(chat_answer(json!([
            { "name": "Jane Doe", "title": "HR Manager", "email": "jane.doe@acme.dk", "phone": "12345678" },
            { "name": "John Doe", "title": "CEO", "email": "john@acme.dk", "phone": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), "llm", key_env);
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(RunMode::Full)
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.rejected_contacts, 1);

    let rows = CsvLedger::new(&config.output.ledger_path).load_rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].detail_url, format!("{}/jobannonce/u1/udvikler", server.uri()));
    assert_eq!(rows[0].company, "Acme A/S");
    assert_eq!(rows[0].contact_name1, "Jane Doe");
    assert_eq!(rows[0].contact_title1, "HR Manager");
    assert_eq!(rows[0].contact_email1, "jane.doe@acme.dk");
    assert_eq!(rows[0].contact_phone1, "12345678");
    assert_eq!(rows[0].contact_name2, "");
}

#[tokio::test]
async fn test_llm_rate_limit_is_retried() {
    let key_env = "JOBBANK_LEADS_TEST_KEY_RETRY";
    std::env::set_var(key_env, "sk-test-retry");

    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_single_job_site(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_answer(json!([
            { "name": "Lone Berg", "title": null, "email": "lone@acme.dk", "phone": null }
        ])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), "llm", key_env);
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(RunMode::Full)
        .await
        .unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.rows_written, 1);

    let rows = CsvLedger::new(&config.output.ledger_path).load_rows().unwrap();
    assert_eq!(rows[0].contact_email1, "lone@acme.dk");
}

#[tokio::test]
async fn test_missing_api_key_fails_when_extraction_needed() {
    let key_env = "JOBBANK_LEADS_TEST_KEY_UNSET";
    std::env::remove_var(key_env);

    let dir = TempDir::new().unwrap();
    let config = test_config("http://127.0.0.1:9", dir.path(), "llm", key_env);
    save_listings(
        std::path::Path::new(&config.output.listings_path),
        &[JobListing {
            detail_url: "http://127.0.0.1:9/jobannonce/x1/job".to_string(),
            ..JobListing::default()
        }],
    )
    .unwrap();

    let result = Coordinator::new(config).unwrap().run(RunMode::ContactsOnly).await;
    assert!(matches!(
        result,
        Err(LeadsError::Config(ConfigError::MissingEnv(ref name))) if name == key_env
    ));
}

#[tokio::test]
async fn test_missing_api_key_is_fine_without_new_job_ads() {
    let key_env = "JOBBANK_LEADS_TEST_KEY_UNUSED";
    std::env::remove_var(key_env);

    let dir = TempDir::new().unwrap();
    let config = test_config("http://127.0.0.1:9", dir.path(), "llm", key_env);
    save_listings(std::path::Path::new(&config.output.listings_path), &[]).unwrap();

    let summary = Coordinator::new(config)
        .unwrap()
        .run(RunMode::ContactsOnly)
        .await
        .unwrap();
    assert_eq!(summary.rows_written, 0);
}
