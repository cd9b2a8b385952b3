//!
//! src/errors.rs  Andrew Belles  Oct 18th, 2026
//!
//! Defines enums and methods of error conversion
//! for errors the stats engine, loader and server use
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("config error: {0}")]
    Config(String),
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl From<reqwest::Error> for StatsError {
    fn from(e: reqwest::Error) -> Self { StatsError::SourceUnavailable(e.to_string()) }
}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self { StatsError::Schema(e.to_string()) }
}

impl From<crate::metrics::MetricError> for StatsError {
    fn from(e: crate::metrics::MetricError) -> Self { StatsError::Parse(e.to_string()) }
}
