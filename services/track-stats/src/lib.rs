//!
//! src/lib.rs  Andrew Belles  Oct 18th, 2026
//!
//! Per-track engagement statistics across artists: play counts,
//! like/play ratios, rankings and highlight summaries, plus the
//! loader and the data server that feed them
//!

pub mod config;
pub mod errors;
pub mod logging;

pub mod catalog;
pub mod fetch;
pub mod highlights;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod ranking;
pub mod refresh;
pub mod server;
pub mod types;

pub use crate::errors::StatsError;
