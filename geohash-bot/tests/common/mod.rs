// Shared fixtures for geohash-bot integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use geohash_bot::sources::{DowSource, StaticSource};
use geohash_bot::{ConsensusMap, Observation};

/// Dow Jones opens around the start of May 2024 (no weekend rows)
pub const DOW_OPENS: [(&str, &str); 12] = [
    ("2024-05-07", "38858.94"),
    ("2024-05-06", "38762.43"),
    ("2024-05-03", "38709.36"),
    ("2024-05-02", "38075.65"),
    ("2024-05-01", "37845.56"),
    ("2024-04-30", "38337.40"),
    ("2024-04-29", "38282.16"),
    ("2024-04-26", "38114.70"),
    ("2024-04-25", "38052.09"),
    ("2024-04-24", "38552.79"),
    ("2024-04-23", "38356.07"),
    ("2024-04-22", "38116.89"),
];

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dow_consensus() -> ConsensusMap {
    ConsensusMap::from_entries(DOW_OPENS)
}

pub fn dow_observations(source: &str) -> Vec<Observation> {
    DOW_OPENS
        .iter()
        .map(|(d, v)| Observation::new(date(d), v, source))
        .collect()
}

/// Source reporting a single (date, value), or nothing
pub fn single(id: &str, reading: Option<(&str, &str)>) -> Box<dyn DowSource> {
    let observations = reading
        .map(|(d, v)| vec![Observation::new(date(d), v, id)])
        .unwrap_or_default();
    Box::new(StaticSource::new(id, observations))
}
