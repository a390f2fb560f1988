//! HTTP client for web crawling
//!
//! Thin wrapper around `reqwest` carrying the crawl's identity header and
//! timeouts. One network round trip per call, no internal retries: retry
//! policy belongs to the caller, and this system performs none. A failed
//! fetch is logged and the unit it belongs to is skipped. Pacing between
//! requests is likewise the engine's concern, not this client's.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use scraper::Html;
use tracing::debug;

use crate::infrastructure::config::HttpConfig;
use crate::infrastructure::error::{ScrapeError, ScrapeResult};

/// HTTP client with a stable identity header and bounded timeouts
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    image_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from the crawl's HTTP configuration.
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.page_timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()?;

        Ok(Self {
            client,
            image_timeout: Duration::from_secs(config.image_timeout_seconds),
        })
    }

    /// Fetch a page and return its body as a string.
    ///
    /// Non-success status, transport errors, timeouts and empty bodies all
    /// become `ScrapeError::Fetch`.
    pub async fn fetch_html_string(&self, url: &str) -> ScrapeResult<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::fetch(url, format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::fetch(url, e))?;

        if body.is_empty() {
            return Err(ScrapeError::fetch(url, "empty response body"));
        }

        debug!("Fetched {} ({} chars)", url, body.len());
        Ok(body)
    }

    /// Parse a fetched body into a document. Kept separate from the fetch so
    /// callers can drop the non-Send `Html` before the next await point.
    pub fn parse_html(&self, body: &str) -> Html {
        Html::parse_document(body)
    }

    /// Fetch a binary payload (an image), with the image timeout applied.
    pub async fn fetch_bytes(&self, url: &str) -> ScrapeResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(self.image_timeout)
            .send()
            .await
            .map_err(|e| ScrapeError::asset(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::asset(url, format!("HTTP status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScrapeError::asset(url, e))?;

        Ok(bytes.to_vec())
    }
}
