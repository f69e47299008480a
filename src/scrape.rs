//! Content retrieval via a Firecrawl-compatible scraping API.
//!
//! The scrape collaborator turns a public URL into main-content markdown. The client requests
//! markdown only and treats a success response without it as an absence signal; it never
//! attempts an extraction fallback of its own.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors raised while retrieving page content.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Scraping service responded with an unexpected status code.
    #[error("Unexpected scrape response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the scraping service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Scraping service answered success but carried no usable content.
    #[error("Scrape response contained no markdown content")]
    MissingContent,
}

/// Interface implemented by content-retrieval backends.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Retrieve the main content of `url` as markdown.
    async fn fetch_main_content(&self, url: &str) -> Result<String, ScrapeError>;
}

/// HTTP client for a Firecrawl-compatible scrape endpoint.
pub struct ScrapeClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ScrapeClient {
    /// Construct a client for the given API base URL and key.
    pub fn new(base_url: String, api_key: String) -> Result<Self, ScrapeError> {
        let http = Client::builder().user_agent("webaudit/0.1").build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/scrape", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    data: Option<ScrapeData>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

#[async_trait]
impl ContentFetcher for ScrapeClient {
    async fn fetch_main_content(&self, url: &str) -> Result<String, ScrapeError> {
        let payload = json!({
            "url": url,
            "formats": ["markdown"],
            "onlyMainContent": true,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::UnexpectedStatus { status, body });
        }

        let body: ScrapeResponse = response.json().await?;
        match body.data.and_then(|data| data.markdown) {
            Some(markdown) => {
                tracing::debug!(url, bytes = markdown.len(), "Scrape returned markdown");
                Ok(markdown)
            }
            None => Err(ScrapeError::MissingContent),
        }
    }
}
