// Source adapters - independent scraped pages reporting the market open
//
// Each adapter fetches one page and turns it into observations. Adapters
// fail independently; the consensus resolver absorbs their failures.

use crate::error::SourceError;
use crate::types::Observation;
use async_trait::async_trait;
use geohash_common::config::SourcesConfig;
use geohash_common::{Error, Result};
use std::time::Duration;

pub mod business_insider;
pub mod fetcher;
pub mod financial_times;
pub mod html;
pub mod investing;

pub use business_insider::BusinessInsiderSource;
pub use fetcher::PageFetcher;
pub use financial_times::FinancialTimesSource;
pub use investing::InvestingSource;

/// Anything that produces market observations
#[async_trait]
pub trait DowSource: Send + Sync {
    /// Source identifier (e.g., "investing", "financial_times")
    fn source_id(&self) -> &str;

    /// Fetch and scrape the source
    ///
    /// # Returns
    /// * `Ok(observations)` - possibly empty
    /// * `Err(_)` - source unavailable (logged, contributes nothing)
    async fn fetch(&self) -> std::result::Result<Vec<Observation>, SourceError>;
}

/// Fixed in-memory observations
///
/// Used for replaying captured values and as a test double.
pub struct StaticSource {
    id: String,
    observations: Vec<Observation>,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            id: id.into(),
            observations,
        }
    }
}

#[async_trait]
impl DowSource for StaticSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> std::result::Result<Vec<Observation>, SourceError> {
        Ok(self.observations.clone())
    }
}

/// Build the configured scraped sources
///
/// Unknown source names are a configuration error.
pub fn build_sources(config: &SourcesConfig) -> Result<Vec<Box<dyn DowSource>>> {
    let fetcher = PageFetcher::new(
        &config.user_agent,
        Duration::from_secs(config.request_timeout_secs),
    )
    .map_err(|e| Error::Internal(format!("HTTP client: {}", e)))?;

    config
        .enabled
        .iter()
        .map(|name| -> Result<Box<dyn DowSource>> {
            match name.as_str() {
                "investing" => Ok(Box::new(InvestingSource::new(fetcher.clone()))),
                "financial_times" => Ok(Box::new(FinancialTimesSource::new(fetcher.clone()))),
                "business_insider" => Ok(Box::new(BusinessInsiderSource::new(fetcher.clone()))),
                other => Err(Error::Config(format!("Unknown source '{}'", other))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_static_source_returns_observations() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let source = StaticSource::new("fixed", vec![Observation::new(date, "100", "fixed")]);

        assert_eq!(source.source_id(), "fixed");
        let observations = source.fetch().await.unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, "100");
    }

    #[test]
    fn test_build_default_sources() {
        let sources = build_sources(&SourcesConfig::default()).unwrap();
        let ids: Vec<_> = sources.iter().map(|s| s.source_id().to_string()).collect();
        assert_eq!(ids, vec!["investing", "financial_times", "business_insider"]);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let config = SourcesConfig {
            enabled: vec!["investing".to_string(), "yahoo".to_string()],
            ..SourcesConfig::default()
        };
        let result = build_sources(&config);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("yahoo")));
    }
}
