//! Poll the consensus resolver until the day's value is agreed
//!
//! Market holidays are not modeled: running out of time is treated as
//! "market closed" and the last map is handed back so lookback can use
//! earlier dates.

use crate::consensus::ConsensusResolver;
use crate::types::ConsensusMap;
use chrono::NaiveDate;
use geohash_common::config::PollingConfig;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Cadence and patience of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&PollingConfig> for PollSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Result of a polling run
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Map from the last resolution cycle
    pub consensus: ConsensusMap,
    /// Number of resolution cycles performed
    pub attempts: u32,
    /// Whether `date` itself reached consensus
    pub reached: bool,
}

/// Resolve repeatedly until `date` has a value or `settings.timeout` elapses
///
/// Always resolves at least once, even with a zero timeout.
pub async fn poll_for_date(
    resolver: &ConsensusResolver,
    date: NaiveDate,
    settings: PollSettings,
) -> PollOutcome {
    let deadline = Instant::now() + settings.timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let consensus = resolver.resolve().await;

        if consensus.contains(date) {
            info!("Consensus for {} reached after {} attempt(s)", date, attempts);
            return PollOutcome {
                consensus,
                attempts,
                reached: true,
            };
        }

        let now = Instant::now();
        if now + settings.interval > deadline {
            warn!(
                "No consensus for {} after {} attempt(s); treating market as closed",
                date, attempts
            );
            return PollOutcome {
                consensus,
                attempts,
                reached: false,
            };
        }

        debug!("No consensus for {} yet, retrying in {:?}", date, settings.interval);
        tokio::time::sleep(settings.interval).await;
    }
}
