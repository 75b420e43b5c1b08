//! URL handling module for Jobbank-Leads
//!
//! Listing pages link to job ads and to the next result page with relative
//! hrefs; these helpers turn them into absolute http(s) URLs and key the
//! rate limiter by host.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use normalize::{parse_http_url, resolve_href};
