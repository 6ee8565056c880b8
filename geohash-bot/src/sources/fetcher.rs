//! Shared HTTP page fetcher for scraped sources

use crate::error::SourceError;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper around a configured reqwest client
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET a page body as text; non-2xx statuses are errors
    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        debug!(url = url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}
