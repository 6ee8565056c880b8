//! Watcher table parsing
//!
//! Watchers register interest in wiki-table rows:
//!
//! ```text
//! {| border="1"
//! !Latitude!!Longitude!!Centicule!!Message!!Settings
//! |-
//! | 47 || -122 || 50 51 52 60 61 62 || || Email, Saturday
//! |}
//! ```
//!
//! `Settings` mixes weekday names with notification channels. Rows without
//! any weekday apply to every day. The config page channel is always on.

use crate::geohash::Graticule;
use chrono::Weekday;
use std::collections::{BTreeMap, HashMap};
use std::ops::BitOrAssign;
use tracing::{debug, warn};

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Where a match gets reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Channels {
    pub config_page: bool,
    pub email: bool,
    pub talkpage: bool,
}

impl Channels {
    pub fn config_page_only() -> Self {
        Self {
            config_page: true,
            ..Self::default()
        }
    }
}

impl BitOrAssign for Channels {
    fn bitor_assign(&mut self, rhs: Self) {
        self.config_page |= rhs.config_page;
        self.email |= rhs.email;
        self.talkpage |= rhs.talkpage;
    }
}

/// Centicule -> channels for one graticule
pub type CenticuleChannels = BTreeMap<String, Channels>;

/// Graticule -> watched centicules for one weekday
pub type DayWatches = BTreeMap<Graticule, CenticuleChannels>;

/// Parsed watcher table, keyed by weekday
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchList {
    days: HashMap<Weekday, DayWatches>,
}

struct Row {
    graticule: Graticule,
    centicules: Vec<String>,
    days: Vec<Weekday>,
    channels: Channels,
}

impl WatchList {
    /// Parse wiki-table text; rows that are not data rows are skipped
    pub fn parse(text: &str) -> Self {
        let mut list = WatchList::default();
        for line in text.lines() {
            if let Some(row) = parse_row(line) {
                list.add(row);
            }
        }
        list
    }

    fn add(&mut self, row: Row) {
        let days: &[Weekday] = if row.days.is_empty() {
            &ALL_DAYS
        } else {
            &row.days
        };

        for day in days {
            let centicules = self
                .days
                .entry(*day)
                .or_default()
                .entry(row.graticule)
                .or_default();
            for centicule in &row.centicules {
                *centicules.entry(centicule.clone()).or_default() |= row.channels;
            }
        }
    }

    /// Watches active on `day`
    pub fn for_day(&self, day: Weekday) -> Option<&DayWatches> {
        self.days.get(&day)
    }

    /// Number of weekdays with at least one watch
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn parse_row(line: &str) -> Option<Row> {
    let line = line.trim();
    if !line.starts_with('|') || ["|-", "|}", "|+"].iter().any(|p| line.starts_with(*p)) {
        return None;
    }

    let fields: Vec<&str> = line[1..].split("||").map(str::trim).collect();
    if fields.len() < 3 {
        debug!("Skipping short watcher row: {}", line);
        return None;
    }

    let (latitude, longitude) = match (fields[0].parse::<i32>(), fields[1].parse::<i32>()) {
        (Ok(lat), Ok(long)) => (lat, long),
        _ => {
            debug!("Skipping watcher row without integer graticule: {}", line);
            return None;
        }
    };

    let centicules = fields[2]
        .split_whitespace()
        .filter(|token| {
            let valid = token.len() == 2 && token.bytes().all(|b| b.is_ascii_digit());
            if !valid {
                warn!("Ignoring invalid centicule '{}' in row: {}", token, line);
            }
            valid
        })
        .map(str::to_string)
        .collect();

    let mut days = Vec::new();
    let mut channels = Channels::config_page_only();
    if let Some(settings) = fields.get(4) {
        for setting in settings.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match setting.to_ascii_lowercase().as_str() {
                "email" => channels.email = true,
                "talkpage" => channels.talkpage = true,
                other => match other.parse::<Weekday>() {
                    Ok(day) => days.push(day),
                    Err(_) => warn!("Unknown watcher setting '{}' in row: {}", setting, line),
                },
            }
        }
    }

    Some(Row {
        graticule: Graticule::new(latitude, longitude),
        centicules,
        days,
        channels,
    })
}
