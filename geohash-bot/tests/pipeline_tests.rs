// End-to-end: sources -> consensus -> watch list -> rendered sections

mod common;

use chrono::Weekday;
use common::{date, dow_observations};
use geohash_bot::notify::{needs_same_day_value, plan_notifications, render_sections};
use geohash_bot::sources::StaticSource;
use geohash_bot::{ConsensusResolver, Graticule, WatchList};

const EDIT_BASE: &str = "https://geohashing.site/index.php?title=";

const WATCHERS: &str = r#"
{| border="1" cellpadding="5" cellspacing="0"
|-
!Latitude!!Longitude!!Centicule!!Message!!Settings
|-
| 47 || -122 || 95 96 || || Email, Tuesday
|-
| 52 || 4 || 19 || || Talkpage
|-
| 40 || -74 || 00 ||
|}
"#;

fn resolver() -> ConsensusResolver {
    ConsensusResolver::new(vec![
        Box::new(StaticSource::new("investing", dow_observations("investing"))),
        Box::new(StaticSource::new("financial_times", dow_observations("financial_times"))),
        Box::new(StaticSource::new("business_insider", Vec::new())),
    ])
}

#[tokio::test]
async fn test_matching_watchers_get_sections() {
    let day = date("2024-04-30");
    let watchlist = WatchList::parse(WATCHERS);
    let consensus = resolver().resolve().await;

    let notifications = plan_notifications(&watchlist, day, &consensus);
    assert_eq!(notifications.len(), 2);

    let west = &notifications[0];
    assert_eq!(west.graticule, Graticule::new(47, -122));
    assert_eq!(west.geohash.centicule, "95");
    assert_eq!(west.geohash.value_date, day);
    assert_eq!(west.external_channels(), vec!["email"]);

    let east = &notifications[1];
    assert_eq!(east.graticule, Graticule::new(52, 4));
    assert_eq!(east.geohash.centicule, "19");
    assert_eq!(east.geohash.value_date, date("2024-04-29"));
    assert_eq!(east.external_channels(), vec!["talkpage"]);

    let page = render_sections(&notifications, EDIT_BASE);
    assert_eq!(
        page,
        "=== [https://geohashing.site/index.php?title=2024-04-30_47_-122 2024-04-30 47 -122] ===\n\
         [https://maps.google.com/?q=47.9023250203492802,-122.5518558190767081 Centicule 95]\n\
         \n\
         === [https://geohashing.site/index.php?title=2024-04-30_52_4 2024-04-30 52 4] ===\n\
         [https://maps.google.com/?q=52.1352540080910259,4.9037177752203457 Centicule 19]\n"
    );
}

#[tokio::test]
async fn test_weekday_restriction() {
    // Wednesday: the Tuesday-only row is inactive
    let day = date("2024-05-01");
    let watchlist = WatchList::parse(WATCHERS);
    assert!(!watchlist.for_day(Weekday::Wed).unwrap().contains_key(&Graticule::new(47, -122)));

    let consensus = resolver().resolve().await;
    let notifications = plan_notifications(&watchlist, day, &consensus);
    assert!(notifications.iter().all(|n| n.graticule != Graticule::new(47, -122)));
}

#[tokio::test]
async fn test_no_consensus_plans_nothing() {
    let resolver = ConsensusResolver::new(vec![Box::new(StaticSource::new(
        "investing",
        dow_observations("investing"),
    ))]);
    let consensus = resolver.resolve().await;
    assert!(consensus.is_empty());

    let watchlist = WatchList::parse(WATCHERS);
    assert!(plan_notifications(&watchlist, date("2024-04-30"), &consensus).is_empty());
}

#[test]
fn test_polling_needed_only_for_west_graticules() {
    let watchlist = WatchList::parse(WATCHERS);
    // Tuesday has the Seattle row; Wednesday only Amsterdam and New York
    assert!(needs_same_day_value(&watchlist, date("2024-04-30")));
    assert!(needs_same_day_value(&watchlist, date("2024-05-01")));

    let east_only = WatchList::parse("| 52 || 4 || 19");
    assert!(!needs_same_day_value(&east_only, date("2024-04-30")));
}
