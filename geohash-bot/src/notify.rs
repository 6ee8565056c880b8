// Notification planning - match derived coordinates against the watch list
//
// Every graticule watched on the date's weekday is derived with its own rule
// flag. Derivation happens at most once per flag since the fractional
// digits do not depend on the graticule itself.

use crate::error::GeohashResult;
use crate::geohash::{derive, Geohash, Graticule};
use crate::types::ConsensusMap;
use crate::watchers::{Channels, WatchList};
use chrono::{Datelike, NaiveDate};
use geohash_common::time::iso_date;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A watched centicule that the day's coordinate landed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub graticule: Graticule,
    pub geohash: Geohash,
    pub channels: Channels,
}

impl Notification {
    /// Channels that need delivery outside the page itself
    pub fn external_channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.channels.email {
            channels.push("email");
        }
        if self.channels.talkpage {
            channels.push("talkpage");
        }
        channels
    }
}

/// Work out which watchers get notified for `date`
///
/// A graticule whose coordinate cannot be derived is logged and skipped;
/// the rest are still planned.
pub fn plan_notifications(
    watchlist: &WatchList,
    date: NaiveDate,
    consensus: &ConsensusMap,
) -> Vec<Notification> {
    let Some(watches) = watchlist.for_day(date.weekday()) else {
        debug!("Nobody watching on {}", date.weekday());
        return Vec::new();
    };

    let mut derived: HashMap<bool, GeohashResult<Geohash>> = HashMap::new();
    let mut notifications = Vec::new();

    for (graticule, centicules) in watches {
        let rule = graticule.uses_prior_day_rule();
        let geohash = match derived
            .entry(rule)
            .or_insert_with(|| derive(consensus, date, rule))
        {
            Ok(geohash) => geohash,
            Err(e) => {
                warn!(
                    "Skipping graticule {} {}: {}",
                    graticule.latitude, graticule.longitude, e
                );
                continue;
            }
        };

        if let Some(channels) = centicules.get(&geohash.centicule) {
            info!(
                "Centicule {} hit in graticule {} {} on {}",
                geohash.centicule, graticule.latitude, graticule.longitude, date
            );
            notifications.push(Notification {
                graticule: *graticule,
                geohash: geohash.clone(),
                channels: *channels,
            });
        }
    }

    notifications
}

/// Whether any graticule watched on `date` needs that day's own value
pub fn needs_same_day_value(watchlist: &WatchList, date: NaiveDate) -> bool {
    watchlist
        .for_day(date.weekday())
        .map(|watches| watches.keys().any(|g| !g.uses_prior_day_rule()))
        .unwrap_or(false)
}

/// Wiki page title for an expedition, e.g. "2020-01-01 1 2"
pub fn expedition_title(date: NaiveDate, graticule: Graticule) -> String {
    format!(
        "{} {} {}",
        iso_date(date),
        graticule.latitude,
        graticule.longitude
    )
}

/// Edit link for a page title
pub fn edit_url(base: &str, title: &str) -> String {
    format!("{}{}", base, title.replace(' ', "_"))
}

/// Wiki text announcing one notification
pub fn render_section(notification: &Notification, edit_url_base: &str) -> String {
    let title = expedition_title(notification.geohash.date, notification.graticule);
    format!(
        "=== [{} {}] ===\n[{} Centicule {}]\n",
        edit_url(edit_url_base, &title),
        title,
        notification.geohash.map_url(notification.graticule),
        notification.geohash.centicule
    )
}

/// All sections separated by blank lines
pub fn render_sections(notifications: &[Notification], edit_url_base: &str) -> String {
    notifications
        .iter()
        .map(|n| render_section(n, edit_url_base))
        .collect::<Vec<_>>()
        .join("\n")
}
