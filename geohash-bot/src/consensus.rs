// Consensus Resolver - quorum voting across independent sources
//
// A date gets a value only when at least two observations exist for it and
// one value string is reported by a strict majority of them. Ties and
// pluralities resolve to nothing.

use crate::sources::DowSource;
use crate::types::{ConsensusMap, Observation};
use futures::future::join_all;
use geohash_common::time::iso_date;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Minimum observations for a date before it is considered at all
pub const MIN_CORROBORATION: usize = 2;

/// Collects observations from every source and votes per date
pub struct ConsensusResolver {
    sources: Vec<Box<dyn DowSource>>,
}

impl ConsensusResolver {
    pub fn new(sources: Vec<Box<dyn DowSource>>) -> Self {
        Self { sources }
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    /// Fetch every source once and return the observations that arrived
    ///
    /// A failing source is logged and contributes nothing.
    pub async fn collect(&self) -> Vec<Observation> {
        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;

        let mut observations = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(batch) => {
                    debug!(
                        source = source.source_id(),
                        count = batch.len(),
                        "Source returned observations"
                    );
                    observations.extend(batch);
                }
                Err(e) => {
                    warn!(source = source.source_id(), error = %e, "Source unavailable");
                }
            }
        }
        observations
    }

    /// Run one resolution cycle
    ///
    /// An empty map is a valid outcome meaning "try again later".
    pub async fn resolve(&self) -> ConsensusMap {
        let observations = self.collect().await;
        let consensus = tally(&observations);
        info!(
            "Consensus resolved: {} observations from {} sources -> {} dates",
            observations.len(),
            self.sources.len(),
            consensus.len()
        );
        consensus
    }
}

/// Vote on observations, independent of their order
pub fn tally(observations: &[Observation]) -> ConsensusMap {
    let mut by_date: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for observation in observations {
        by_date
            .entry(iso_date(observation.date))
            .or_default()
            .push(observation.value.as_str());
    }

    let mut agreed = BTreeMap::new();
    for (date, values) in by_date {
        if values.len() < MIN_CORROBORATION {
            debug!("Only {} observation for {}, skipping", values.len(), date);
            continue;
        }

        match majority(&values) {
            Some(value) => {
                agreed.insert(date, value.to_string());
            }
            None => {
                debug!("No majority for {} among {:?}", date, values);
            }
        }
    }

    ConsensusMap::new(agreed)
}

/// The value held by strictly more than half of `values`, if any
fn majority<'a>(values: &[&'a str]) -> Option<&'a str> {
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }

    // At most one value can exceed half, so iteration order is irrelevant
    counts
        .into_iter()
        .find(|(_, count)| count * 2 > values.len())
        .map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(day: u32, value: &str, source: &str) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(2020, 1, day).unwrap(), value, source)
    }

    #[test]
    fn test_majority_strict() {
        assert_eq!(majority(&["a", "a", "b"]), Some("a"));
        assert_eq!(majority(&["a", "b", "c"]), None);
        assert_eq!(majority(&["a", "b"]), None);
        assert_eq!(majority(&["a", "a", "b", "b"]), None);
        assert_eq!(majority(&["a", "a", "a", "b"]), Some("a"));
    }

    #[test]
    fn test_tally_requires_two_observations() {
        let consensus = tally(&[obs(1, "100", "a")]);
        assert!(consensus.is_empty());
    }

    #[test]
    fn test_tally_string_equality_only() {
        // Same number, different spelling: no agreement
        let consensus = tally(&[obs(1, "100.0", "a"), obs(1, "100", "b")]);
        assert!(consensus.is_empty());

        // Thousands separators are stripped before voting
        let consensus = tally(&[obs(1, "1,000.50", "a"), obs(1, "1000.50", "b")]);
        assert_eq!(consensus.get_str("2020-01-01"), Some("1000.50"));
    }

    #[test]
    fn test_tally_is_order_independent() {
        let forward = vec![
            obs(1, "100", "a"),
            obs(1, "101", "b"),
            obs(1, "100", "c"),
            obs(2, "103", "a"),
            obs(2, "103", "b"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(tally(&forward), tally(&reversed));
        assert_eq!(tally(&forward).len(), 2);
    }
}
