//! Shared data contracts between source adapters, the consensus resolver
//! and the coordinate deriver.

use chrono::NaiveDate;
use geohash_common::time::iso_date;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (date, value) reading scraped from one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Value string with thousands separators removed
    pub value: String,
    pub source: String,
}

impl Observation {
    pub fn new(date: NaiveDate, raw_value: &str, source: impl Into<String>) -> Self {
        Self {
            date,
            value: normalize_value(raw_value),
            source: source.into(),
        }
    }
}

/// Strip thousands separators and surrounding whitespace
///
/// No numeric coercion: "38337.40" and "38337.4" stay distinct.
pub fn normalize_value(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ',').collect()
}

/// Agreed market value per date (`YYYY-MM-DD` keys)
///
/// Built fresh by each resolution cycle; never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsensusMap {
    values: BTreeMap<String, String>,
}

impl ConsensusMap {
    pub(crate) fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Build a map from already-agreed entries (replays, fixtures)
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&str> {
        self.get_str(&iso_date(date))
    }

    pub fn get_str(&self, date: &str) -> Option<&str> {
        self.values.get(date).map(String::as_str)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators_only() {
        assert_eq!(normalize_value("38,337.40"), "38337.40");
        assert_eq!(normalize_value(" 1,234,567 "), "1234567");
        assert_eq!(normalize_value("38337.4"), "38337.4");
    }

    #[test]
    fn test_consensus_map_lookup_by_date() {
        let map = ConsensusMap::from_entries([("2024-04-30", "38337.40")]);
        let date = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();

        assert_eq!(map.get(date), Some("38337.40"));
        assert!(map.contains(date));
        assert!(!map.contains(date.succ_opt().unwrap()));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let map = ConsensusMap::from_entries([("2024-04-30", "38337.40")]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2024-04-30":"38337.40"}"#);

        let back: ConsensusMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_iter_sorted_by_date() {
        let map = ConsensusMap::from_entries([
            ("2024-05-01", "b"),
            ("2024-04-30", "a"),
        ]);
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["2024-04-30", "2024-05-01"]);
    }
}
