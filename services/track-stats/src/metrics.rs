//!
//! src/metrics.rs  Andrew Belles  Oct 18th, 2026
//!
//! Derives play counts and like/play ratios from the raw counters
//! scraped into each track record, plus the per-view values the
//! dashboard sorts and averages on
//!

use std::cmp::Ordering;

use thiserror::Error;

use crate::types::TrackRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("play count {0:?} is not numeric")]
    NotNumeric(String),
    #[error("play count {0:?} is negative")]
    Negative(String),
    #[error("play count {0:?} overflows")]
    Overflow(String),
}

/// Leading integer of `s` the way a browser's `parseInt` reads it:
/// skips leading whitespace, takes an optional sign and the digit run,
/// ignores whatever follows. `None` when no digit is found.
pub fn parse_leading_int(s: &str) -> Option<i128> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    // saturate instead of failing on absurdly long digit runs
    let value = digits.parse::<i128>().unwrap_or(i128::MAX);
    Some(if negative { -value } else { value })
}

/// `parseInt(s) || 0` for the optional counters; negatives count as zero
pub fn lenient_count(s: Option<&str>) -> u64 {
    s.and_then(parse_leading_int)
        .filter(|v| *v > 0)
        .map(|v| u64::try_from(v).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Play count for a track.
///
/// Commas are stripped and a trailing `K` becomes `000` before the
/// leading integer is read. A count below the like count means the
/// source abbreviated it one step too far, so it is scaled by 1000.
pub fn derive_plays(track: &TrackRecord) -> Result<u64, MetricError> {
    let mut raw: String = track.scministats.chars().filter(|c| *c != ',').collect();
    if raw.ends_with('K') {
        raw.pop();
        raw.push_str("000");
    }

    let parsed = parse_leading_int(&raw)
        .ok_or_else(|| MetricError::NotNumeric(track.scministats.clone()))?;
    if parsed < 0 {
        return Err(MetricError::Negative(track.scministats.clone()));
    }
    let plays = u64::try_from(parsed)
        .map_err(|_| MetricError::Overflow(track.scministats.clone()))?;

    if plays < track.likes {
        return plays.checked_mul(1000)
            .ok_or_else(|| MetricError::Overflow(track.scministats.clone()));
    }
    Ok(plays)
}

/// Likes per play as a percentage with two decimals.
/// Zero plays yields 0 instead of an infinite ratio.
pub fn derive_ratio(track: &TrackRecord) -> Result<f64, MetricError> {
    let plays = derive_plays(track)?;
    Ok(ratio_percent(track.likes, plays))
}

pub fn ratio_percent(likes: u64, plays: u64) -> f64 {
    if plays == 0 {
        return 0.0;
    }
    ((likes as f64 / plays as f64) * 10_000.0).round() / 100.0
}

/// Raw like/play fraction used by the top songs table, unrounded
pub fn play_like_fraction(likes: u64, plays: u64) -> f64 {
    if plays == 0 {
        0.0
    } else {
        likes as f64 / plays as f64
    }
}

/// Round to two decimals, as the dashboard displays averages
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Metric a chart axis or a sort can be driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricView {
    #[default]
    Ratio,
    Plays,
    Likes,
}

impl MetricView {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricView::Ratio => "ratio",
            MetricView::Plays => "plays",
            MetricView::Likes => "likes",
        }
    }

    pub fn parse(s: &str) -> Option<MetricView> {
        match s {
            "ratio" => Some(MetricView::Ratio),
            "plays" => Some(MetricView::Plays),
            "likes" => Some(MetricView::Likes),
            _ => None,
        }
    }

    /// Axis title shown for this view
    pub fn label(self) -> &'static str {
        match self {
            MetricView::Ratio => "Plays/Likes Ratio (%)",
            MetricView::Plays => "Total Plays",
            MetricView::Likes => "Total Likes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

pub fn view_value(track: &TrackRecord, view: MetricView) -> Result<f64, MetricError> {
    match view {
        MetricView::Ratio => derive_ratio(track),
        MetricView::Plays => derive_plays(track).map(|p| p as f64),
        MetricView::Likes => Ok(track.likes as f64),
    }
}

/// Stable sort on a single view. Tracks whose value cannot be derived
/// are dropped and counted.
pub fn sort_by_view(
    tracks: &[TrackRecord],
    view: MetricView,
    order: SortOrder
) -> (Vec<TrackRecord>, usize) {
    let mut keyed = Vec::with_capacity(tracks.len());
    let mut excluded = 0;
    for track in tracks {
        match view_value(track, view) {
            Ok(v) => keyed.push((v, track)),
            Err(_) => excluded += 1,
        }
    }

    keyed.sort_by(|a, b| {
        let ord = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    (keyed.into_iter().map(|(_, t)| t.clone()).collect(), excluded)
}
