// Coordinate Deriver - date + market value -> reproducible coordinate
//
// Hash input is "<target date>-<value>"; the MD5 digest's two 64-bit halves
// become the fractional parts of latitude and longitude. Lookback only
// chooses which value is used, never the date in the hash input.

use crate::error::{GeohashError, GeohashResult};
use crate::types::ConsensusMap;
use chrono::{Duration, NaiveDate};
use geohash_common::time::{iso_date, prior_day_rule_cutoff};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Calendar days searched backward for a known value
pub const LOOKBACK_DAYS: u32 = 10;

/// 2^64 as a float; dividing by it is exact
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Integer-degree cell a watcher follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Graticule {
    pub latitude: i32,
    pub longitude: i32,
}

impl Graticule {
    pub fn new(latitude: i32, longitude: i32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this graticule uses the prior trading day's value
    pub fn uses_prior_day_rule(&self) -> bool {
        geohash_common::time::uses_prior_day_rule(self.longitude)
    }
}

impl fmt::Display for Graticule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses "lat,long", e.g. "47,-122"
impl FromStr for Graticule {
    type Err = geohash_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || geohash_common::Error::InvalidInput(format!("bad graticule '{}'", s));
        let (lat, long) = s.split_once(',').ok_or_else(invalid)?;
        let latitude = lat.trim().parse().map_err(|_| invalid())?;
        let longitude = long.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(latitude, longitude))
    }
}

/// A derived coordinate
///
/// `latitude` and `longitude` hold only the fractional decimal digits; the
/// integer part comes from the graticule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geohash {
    /// Date embedded in the hash input
    pub date: NaiveDate,
    /// Date whose market value was used
    pub value_date: NaiveDate,
    pub value: String,
    pub latitude: String,
    pub longitude: String,
    /// First latitude digit followed by first longitude digit
    pub centicule: String,
}

impl Geohash {
    /// Map link for this coordinate inside a graticule
    pub fn map_url(&self, graticule: Graticule) -> String {
        format!(
            "https://maps.google.com/?q={}.{},{}.{}",
            graticule.latitude, self.latitude, graticule.longitude, self.longitude
        )
    }
}

/// Find the value that applies to `target`, walking back at most `LOOKBACK_DAYS`
///
/// With the prior-day rule, every candidate on or after the cutoff is
/// shifted one day earlier before lookup.
pub fn lookup_value(
    consensus: &ConsensusMap,
    target: NaiveDate,
    use_prior_day_rule: bool,
) -> GeohashResult<(NaiveDate, &str)> {
    let cutoff = prior_day_rule_cutoff();

    for offset in 0..LOOKBACK_DAYS {
        let mut candidate = target - Duration::days(i64::from(offset));
        if use_prior_day_rule && candidate >= cutoff {
            candidate -= Duration::days(1);
        }

        if let Some(value) = consensus.get(candidate) {
            return Ok((candidate, value));
        }
    }

    Err(GeohashError::NoHistoricalValue {
        date: target,
        window_days: LOOKBACK_DAYS,
    })
}

/// Derive the coordinate for `target`
pub fn derive(
    consensus: &ConsensusMap,
    target: NaiveDate,
    use_prior_day_rule: bool,
) -> GeohashResult<Geohash> {
    let (value_date, value) = lookup_value(consensus, target, use_prior_day_rule)?;
    let geohash = compute(target, value_date, value)?;
    info!(
        "Geohash for {} (value {} from {}): {} {} centicule {}",
        target, value, value_date, geohash.latitude, geohash.longitude, geohash.centicule
    );
    Ok(geohash)
}

/// Hash a known (date, value) pair without any lookback
pub fn compute(date: NaiveDate, value_date: NaiveDate, value: &str) -> GeohashResult<Geohash> {
    if value.trim().is_empty() {
        return Err(GeohashError::InvalidValue("empty value".to_string()));
    }

    let input = format!("{}-{}", iso_date(date), value);
    let digest = hex::encode(Md5::digest(input.as_bytes()));
    let (lat_hex, long_hex) = digest.split_at(16);

    let latitude = fraction_digits(hex_fraction(lat_hex)?);
    let longitude = fraction_digits(hex_fraction(long_hex)?);
    let centicule = centicule(&latitude, &longitude);

    Ok(Geohash {
        date,
        value_date,
        value: value.to_string(),
        latitude,
        longitude,
        centicule,
    })
}

/// Value of `0.<hex>` as a double, rounded to nearest like a hex float literal
pub fn hex_fraction(hex_digits: &str) -> GeohashResult<f64> {
    if hex_digits.is_empty() || hex_digits.len() > 16 {
        return Err(GeohashError::Digest(format!(
            "expected 1-16 hex digits, got {}",
            hex_digits.len()
        )));
    }

    let bits = u64::from_str_radix(hex_digits, 16)
        .map_err(|e| GeohashError::Digest(format!("'{}': {}", hex_digits, e)))?;

    // Left-align so shorter inputs keep their place value
    let aligned = bits << (4 * (16 - hex_digits.len()));

    // u64 -> f64 rounds to nearest-even; scaling by 2^-64 is exact
    Ok(aligned as f64 / TWO_POW_64)
}

/// Decimal digits after "0." in the shortest round-trip form of `fraction`
///
/// Rounding up to exactly 1.0 yields "0", like a zero fraction.
pub fn fraction_digits(fraction: f64) -> String {
    if fraction <= 0.0 || fraction >= 1.0 {
        return "0".to_string();
    }

    // Display for f64 prints the shortest round-trip digits, never an exponent
    let text = fraction.to_string();
    text.strip_prefix("0.").unwrap_or(&text).to_string()
}

fn centicule(latitude: &str, longitude: &str) -> String {
    latitude
        .chars()
        .take(1)
        .chain(longitude.chars().take(1))
        .collect()
}
