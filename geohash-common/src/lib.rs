//! # Geohash Common Library
//!
//! Shared code for the geohash tooling including:
//! - Error types
//! - Configuration loading (TOML) and config path resolution
//! - Market-day time helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
