//! Markup fetching.
//!
//! [`Fetcher`] is the seam between the orchestrator and the network, kept as
//! a trait so tests can count or script fetches. [`HttpFetcher`] is the
//! default implementation over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{ExtractError, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Excerpta/0.1; +https://github.com/stormlightlabs/excerpta)";

/// Retrieves raw markup for a URL within a timeout.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// HTTP fetcher with browser-like headers.
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: Option<String>) -> Self {
        Self {
            client: Client::builder().build().unwrap_or_default(),
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExtractError::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())));
        }

        let timeout_ms = timeout.as_millis() as u64;
        let request = self
            .client
            .get(parsed)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9");

        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| ExtractError::Timeout { timeout_ms })?
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout { timeout_ms }
                } else {
                    ExtractError::Network(e.to_string())
                }
            })?;

        response.text().await.map_err(|e| ExtractError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let fetcher = HttpFetcher::default();
        let result = fetcher.fetch("not-a-url", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ExtractError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let fetcher = HttpFetcher::default();
        let result = fetcher.fetch("ftp://example.com/file.html", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ExtractError::InvalidUrl(_))));
    }
}
