//! geohash-bot library interface
//!
//! Exposes the acquisition and derivation pipeline for the binary and for
//! integration testing:
//! - `sources` scrape the market open from independent pages
//! - `consensus` votes per date across sources
//! - `geohash` derives the day's coordinate
//! - `watchers`/`notify` match coordinates against registered centicules

pub mod consensus;
pub mod error;
pub mod geohash;
pub mod notify;
pub mod poller;
pub mod sources;
pub mod types;
pub mod watchers;

pub use crate::consensus::ConsensusResolver;
pub use crate::error::{GeohashError, GeohashResult, SourceError};
pub use crate::geohash::{Geohash, Graticule};
pub use crate::types::{ConsensusMap, Observation};
pub use crate::watchers::WatchList;
