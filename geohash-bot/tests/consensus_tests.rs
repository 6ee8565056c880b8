// Consensus resolver integration tests
//
// Sources are in-memory doubles; the resolver is rebuilt for every cycle the
// same way a fresh poll would see changed pages.

mod common;

use async_trait::async_trait;
use common::{date, dow_observations, single, DOW_OPENS};
use geohash_bot::sources::{DowSource, StaticSource};
use geohash_bot::{ConsensusResolver, Observation, SourceError};

struct BrokenSource;

#[async_trait]
impl DowSource for BrokenSource {
    fn source_id(&self) -> &str {
        "broken"
    }

    async fn fetch(&self) -> Result<Vec<Observation>, SourceError> {
        Err(SourceError::Layout("table not found".to_string()))
    }
}

async fn resolve_readings(readings: [Option<(&str, &str)>; 3]) -> geohash_bot::ConsensusMap {
    let sources = readings
        .iter()
        .enumerate()
        .map(|(i, reading)| single(&format!("s{}", i + 1), *reading))
        .collect();
    ConsensusResolver::new(sources).resolve().await
}

/// All three sources report on 2020-01-01
async fn same_day(first: &str, second: &str, third: &str) -> geohash_bot::ConsensusMap {
    let day = "2020-01-01";
    resolve_readings([Some((day, first)), Some((day, second)), Some((day, third))]).await
}

// ================================================================================================
// Quorum behaviour as individual sources drift
// ================================================================================================

#[tokio::test]
async fn test_quorum_follows_majority() {
    let day = "2020-01-01";

    let consensus = same_day("100", "100", "100").await;
    assert_eq!(consensus.get_str(day), Some("100"));

    // One source disagrees: still two of three
    let consensus = same_day("101", "100", "100").await;
    assert_eq!(consensus.get_str(day), Some("100"));

    // Majority flips
    let consensus = same_day("101", "101", "100").await;
    assert_eq!(consensus.get_str(day), Some("101"));

    // Three-way split: nothing agreed
    let consensus = same_day("102", "101", "100").await;
    assert!(consensus.is_empty());

    let consensus = same_day("102", "101", "102").await;
    assert_eq!(consensus.get_str(day), Some("102"));

    // A source moving to another date leaves two observations that still agree
    let consensus = resolve_readings([
        Some((day, "102")),
        Some(("2020-01-02", "103")),
        Some((day, "102")),
    ])
    .await;
    assert_eq!(consensus.get_str(day), Some("102"));
    assert_eq!(consensus.get_str("2020-01-02"), None);

    // A lone observation is never enough
    let consensus = resolve_readings([None, Some(("2020-01-02", "103")), Some((day, "102"))]).await;
    assert!(consensus.is_empty());
}

#[tokio::test]
async fn test_two_sources_disagreeing_resolve_nothing() {
    let consensus = resolve_readings([
        Some(("2020-01-01", "100")),
        Some(("2020-01-01", "101")),
        None,
    ])
    .await;
    assert!(consensus.is_empty());
}

// ================================================================================================
// Source failures
// ================================================================================================

#[tokio::test]
async fn test_failing_source_is_absorbed() {
    let resolver = ConsensusResolver::new(vec![
        Box::new(StaticSource::new("a", dow_observations("a"))),
        Box::new(BrokenSource),
        Box::new(StaticSource::new("c", dow_observations("c"))),
    ]);

    let consensus = resolver.resolve().await;
    assert_eq!(consensus.len(), DOW_OPENS.len());
    assert_eq!(consensus.get(date("2024-04-30")), Some("38337.40"));
}

#[tokio::test]
async fn test_all_sources_failing_yields_empty_map() {
    let resolver = ConsensusResolver::new(vec![Box::new(BrokenSource), Box::new(BrokenSource)]);
    assert!(resolver.resolve().await.is_empty());
}

#[tokio::test]
async fn test_collect_keeps_source_attribution() {
    let resolver = ConsensusResolver::new(vec![
        single("a", Some(("2024-04-30", "38,337.40"))),
        Box::new(BrokenSource),
    ]);
    assert_eq!(resolver.source_ids(), vec!["a", "broken"]);

    let observations = resolver.collect().await;
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].source, "a");
    assert_eq!(observations[0].value, "38337.40");
}
