//! Integration tests for Sumi-Spider
//!
//! Each test drives a full `Spider::run` against a wiremock server.

mod crawl_tests;
mod pipeline_tests;
