//!
//! src/highlights.rs  Andrew Belles  Oct 18th, 2026
//!
//! Cross-artist summary cards: totals, most played track, average
//! likes, latest upload, and how each moved since the last snapshot
//!

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::catalog::ArtistCatalog;
use crate::metrics::{derive_plays, lenient_count};
use crate::types::Selection;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub total_plays: u64,
    pub popular_track: String,
    pub max_plays: u64,
    pub avg_likes: f64,
    pub recent_activity: String,
    pub total_reposts: u64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub highlights: Highlights,
    pub excluded: usize,
}

/// Parse the scraped upload date. Accepts RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` timestamp (read as UTC) or a bare date.
pub fn parse_track_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Short US-style date the highlight card shows, e.g. `3/7/2024`
pub fn display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%-m/%-d/%Y").to_string()
}

/// Summarize every track of every selected artist. The search term does
/// not narrow the highlights. Tracks whose play count cannot be derived
/// are left out of every figure and counted in `excluded`.
pub fn aggregate(selection: &Selection, catalog: &ArtistCatalog) -> Aggregation {
    let mut agg = Aggregation::default();
    let mut total_likes: u64 = 0;
    let mut track_count: u64 = 0;
    let mut most_recent = DateTime::<Utc>::UNIX_EPOCH;

    for (_, track) in catalog.selected(selection) {
        let plays = match derive_plays(track) {
            Ok(p) => p,
            Err(_) => {
                agg.excluded += 1;
                continue;
            }
        };
        let h = &mut agg.highlights;

        h.total_plays = h.total_plays.saturating_add(plays);
        if plays > h.max_plays {
            h.max_plays = plays;
            h.popular_track = track.title.clone();
        }

        total_likes = total_likes.saturating_add(track.likes);
        track_count += 1;

        if let Some(dt) = track.date.as_deref().and_then(parse_track_date) {
            if dt > most_recent {
                most_recent = dt;
                h.recent_activity = display_date(&dt);
            }
        }

        h.total_reposts = h.total_reposts.saturating_add(lenient_count(track.reposts.as_deref()));
        h.total_comments = h.total_comments.saturating_add(lenient_count(track.comments.as_deref()));
    }

    if track_count > 0 {
        agg.highlights.avg_likes = total_likes as f64 / track_count as f64;
    }
    agg
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Movement of one numeric card since the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub change: f64,
    pub percent: f64,
    pub direction: Direction,
}

impl Trend {
    pub fn between(current: f64, previous: f64) -> Self {
        let change = current - previous;
        let percent = if previous != 0.0 { change / previous * 100.0 } else { 0.0 };
        let direction = if change >= 0.0 { Direction::Up } else { Direction::Down };
        Self { change, percent, direction }
    }

    /// `▲ 12.5%` style label
    pub fn label(&self) -> String {
        let arrow = match self.direction {
            Direction::Up => '▲',
            Direction::Down => '▼',
        };
        format!("{arrow} {:.1}%", self.percent.abs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightTrends {
    pub total_plays: Trend,
    pub avg_likes: Trend,
    pub total_reposts: Trend,
    pub total_comments: Trend,
    pub popular_track_changed: bool,
    pub recent_activity_changed: bool,
}

impl HighlightTrends {
    pub fn between(current: &Highlights, previous: &Highlights) -> Self {
        Self {
            total_plays: Trend::between(current.total_plays as f64, previous.total_plays as f64),
            avg_likes: Trend::between(current.avg_likes, previous.avg_likes),
            total_reposts: Trend::between(
                current.total_reposts as f64, previous.total_reposts as f64
            ),
            total_comments: Trend::between(
                current.total_comments as f64, previous.total_comments as f64
            ),
            popular_track_changed: current.popular_track != previous.popular_track,
            recent_activity_changed: current.recent_activity != previous.recent_activity,
        }
    }
}
