//! HTTP fetcher implementation
//!
//! Builds the shared HTTP client (user agent, `Accept: text/html`, redirect
//! limit, per-request timeout) and fetches one page at a time. A failed
//! fetch is terminal for that address: there is no retry.

use crate::SpiderError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Default `User-Agent` sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Ubuntu Chromium/71.0.3578.98 Chrome/71.0.3578.98 Safari/537.36";

/// Settings for building the HTTP client
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub max_redirects: usize,
    pub timeout: Duration,
}

/// A fetched page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_spider::crawler::{build_http_client, FetchSettings, DEFAULT_USER_AGENT};
///
/// let settings = FetchSettings {
///     user_agent: DEFAULT_USER_AGENT.to_string(),
///     max_redirects: 3,
///     timeout: Duration::from_secs(10),
/// };
/// let client = build_http_client(&settings).unwrap();
/// ```
pub fn build_http_client(settings: &FetchSettings) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .timeout(settings.timeout)
        .redirect(Policy::limited(settings.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and reads its body
///
/// Non-success status codes are returned like any other response; only
/// transport failures (connection, timeout, redirect limit, unreadable
/// body) are errors.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, SpiderError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| SpiderError::Http {
            url: url.to_string(),
            source,
        })?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let body = response.text().await.map_err(|source| SpiderError::Body {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchedPage {
        final_url,
        status_code,
        body,
    })
}
