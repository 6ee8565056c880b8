//! Calendar helpers for market-day and longitude-rule handling

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Offset (minutes west of UTC) at which the expedition day rolls over
const DAY_ROLLOVER_OFFSET_MINUTES: i64 = 5 * 60 + 30;

/// Integer longitudes at or above this use the prior trading day's value
pub const PRIOR_DAY_RULE_LONGITUDE: i32 = -30;

/// Date format used for consensus keys and hash input
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// First date on which the prior-day rule applies
pub fn prior_day_rule_cutoff() -> NaiveDate {
    // Safe: literal date is valid
    NaiveDate::from_ymd_opt(2008, 5, 27).unwrap()
}

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar date treated as "today" for expeditions at the given instant
///
/// Evaluated in a fixed UTC-05:30 offset, so the date changes at 05:30 UTC.
pub fn market_today(now_utc: DateTime<Utc>) -> NaiveDate {
    (now_utc - Duration::minutes(DAY_ROLLOVER_OFFSET_MINUTES)).date_naive()
}

/// Whether a graticule with this integer longitude is subject to the prior-day rule
pub fn uses_prior_day_rule(longitude: i32) -> bool {
    longitude >= PRIOR_DAY_RULE_LONGITUDE
}

/// Format a date as `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)
        .map_err(|e| crate::Error::InvalidInput(format!("bad date '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_market_today_before_rollover() {
        // 05:29 UTC is still the previous expedition day
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 5, 29, 0).unwrap();
        assert_eq!(market_today(now), NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
    }

    #[test]
    fn test_market_today_after_rollover() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 5, 30, 0).unwrap();
        assert_eq!(market_today(now), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let afternoon = Utc.with_ymd_and_hms(2020, 1, 1, 13, 30, 0).unwrap();
        assert_eq!(market_today(afternoon), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn test_prior_day_rule_boundary() {
        assert!(uses_prior_day_rule(2));
        assert!(uses_prior_day_rule(0));
        assert!(uses_prior_day_rule(-30));
        assert!(!uses_prior_day_rule(-31));
        assert!(!uses_prior_day_rule(-122));
    }

    #[test]
    fn test_cutoff_date() {
        assert_eq!(iso_date(prior_day_rule_cutoff()), "2008-05-27");
    }

    #[test]
    fn test_iso_round_trip() {
        let date = parse_iso_date(" 2024-04-30 ").unwrap();
        assert_eq!(iso_date(date), "2024-04-30");
        assert!(parse_iso_date("30/04/2024").is_err());
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }
}
