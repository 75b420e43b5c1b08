//! Integration tests for the jobbank-leads pipeline
//!
//! These tests use wiremock to serve listing pages, job ads and an
//! OpenAI-compatible endpoint, and run the pipeline end-to-end.

mod common;
mod llm_tests;
mod pipeline_tests;
