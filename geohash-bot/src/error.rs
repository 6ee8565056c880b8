//! Error types for geohash-bot
//!
//! A failing source never escapes the consensus resolver; only coordinate
//! derivation failures are surfaced to callers.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single source adapter
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Page no longer has the shape the adapter expects
    #[error("Page layout changed: {0}")]
    Layout(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Coordinate derivation failure
#[derive(Debug, Error)]
pub enum GeohashError {
    /// Nothing in the lookback window had an agreed value
    #[error("No market value within {window_days} days before {date}")]
    NoHistoricalValue { date: NaiveDate, window_days: u32 },

    #[error("Invalid market value: {0}")]
    InvalidValue(String),

    #[error("Digest conversion failed: {0}")]
    Digest(String),
}

/// Result type for coordinate derivation
pub type GeohashResult<T> = Result<T, GeohashError>;
