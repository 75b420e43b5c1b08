//! Shared fixtures for the integration tests

use jobbank_leads::config::{parse_config, Config};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration pointing at the mock server
///
/// Delays are in the millisecond range and the memory threshold is 100% so
/// the gate never pauses.
pub fn test_config(server: &str, dir: &Path, strategy: &str, api_key_env: &str) -> Config {
    let toml = format!(
        r##"
[site]
start-url = "{server}/jobsoegning"
max-pages = 10

[extraction]
strategy = "{strategy}"
container-selector = "#job_ad"

[llm]
api-base = "{server}/v1"
api-key-env = "{api_key_env}"

[dispatcher]
memory-threshold-percent = 100.0
check-interval-ms = 10
max-session-permit = 4

[rate-limiter]
base-delay-min-ms = 1
base-delay-max-ms = 2
max-delay-ms = 20
max-retries = 3

[monitor]
enabled = true
display-mode = "detailed"
report-interval-ms = 50

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[output]
listings-path = '{listings}'
ledger-path = '{ledger}'
"##,
        server = server,
        strategy = strategy,
        api_key_env = api_key_env,
        listings = dir.join("job_urls.json").display(),
        ledger = dir.join("job_contacts.csv").display(),
    );

    parse_config(&toml).expect("test config is valid")
}

/// A search results page in the markup of it-jobbank.dk
pub fn listing_page(jobs: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let rows: String = jobs
        .iter()
        .map(|(href, title, company)| {
            format!(
                r#"<div class="jobsearch-result">
                     <a href="{href}"><h2 class="job-title"> {title} </h2></a>
                     <div class="job-company">{company}</div>
                     <div class="job-location">København</div>
                   </div>"#
            )
        })
        .collect();

    let pager = next
        .map(|href| {
            format!(r#"<ul><li class="page-item page-item-next"><a href="{href}">Næste</a></li></ul>"#)
        })
        .unwrap_or_default();

    format!("<html><body><main>{rows}</main>{pager}</body></html>")
}

/// A job ad with the given text inside `#job_ad`
pub fn job_ad(text: &str) -> String {
    format!(
        r#"<html><body><nav>Log ind</nav><div id="job_ad"><p>{text}</p></div>
           <footer>kundeservice@jobsite.dk</footer></body></html>"#
    )
}

/// Mounts a GET mock answering `body` with status 200
pub async fn serve_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
