//!
//! src/ranking.rs  Andrew Belles  Oct 18th, 2026
//!
//! Orders tracks across artists for the scatter chart and the
//! top songs table, and computes the per-artist and axis summaries
//! drawn next to them
//!

use std::cmp::Ordering;

use serde::Serialize;

use crate::catalog::ArtistCatalog;
use crate::metrics::{
    derive_plays, play_like_fraction, ratio_percent, round2, view_value, MetricView
};
use crate::types::{RankedEntry, Selection, TaggedTrack};

/// Ranked entries plus the number of tracks whose metrics failed to derive
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedEntry>,
    pub excluded: usize,
}

fn annotate<I>(tracks: I) -> Ranking
where
    I: IntoIterator<Item = TaggedTrack>,
{
    let mut ranking = Ranking::default();
    for TaggedTrack { artist, track } in tracks {
        match derive_plays(&track) {
            Ok(plays) => {
                let ratio = ratio_percent(track.likes, plays);
                ranking.entries.push(RankedEntry { track, artist, plays, ratio });
            }
            Err(_) => ranking.excluded += 1,
        }
    }
    ranking
}

/// Ratio desc, then plays desc, then likes desc. Full ties keep input order.
pub fn rank<I>(tracks: I) -> Ranking
where
    I: IntoIterator<Item = TaggedTrack>,
{
    let mut ranking = annotate(tracks);
    ranking.entries.sort_by(|a, b| {
        b.ratio.partial_cmp(&a.ratio).unwrap_or(Ordering::Equal)
            .then_with(|| b.plays.cmp(&a.plays))
            .then_with(|| b.track.likes.cmp(&a.track.likes))
    });
    ranking
}

/// Rank the selected artists' tracks that pass the search filter
pub fn rank_selection(catalog: &ArtistCatalog, selection: &Selection) -> Ranking {
    let tracks = catalog.tagged(selection)
        .into_iter()
        .filter(|t| selection.matches(&t.track));
    rank(tracks)
}

/// One page of the top songs table.
///
/// Orders on the unrounded like/play fraction only, ties keep catalog
/// order; plays and likes are not used as tie-breaks here. `page` is
/// 1-based, page 0 is read as page 1.
pub fn top_songs(
    catalog: &ArtistCatalog,
    selection: &Selection,
    page: usize,
    page_size: usize
) -> Ranking {
    let tracks = catalog.tagged(selection)
        .into_iter()
        .filter(|t| selection.matches(&t.track));
    let Ranking { entries, excluded } = annotate(tracks);

    let mut keyed: Vec<(f64, RankedEntry)> = entries.into_iter()
        .map(|e| (play_like_fraction(e.track.likes, e.plays), e))
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    let entries = keyed.into_iter()
        .skip(start)
        .take(page_size)
        .map(|(_, e)| e)
        .collect();
    Ranking { entries, excluded }
}

/// 1-based table position of the `index`-th row of `page`
pub fn table_rank(page: usize, page_size: usize, index: usize) -> usize {
    page.max(1).saturating_sub(1) * page_size + index + 1
}

/// Row of the top songs table as displayed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub rank: usize,
    pub title: String,
    pub artist: String,
    pub plays: u64,
    pub likes: u64,
    pub ratio: String,
}

pub fn table_rows(page_of: &Ranking, page: usize, page_size: usize) -> Vec<TableRow> {
    page_of.entries.iter()
        .enumerate()
        .map(|(i, e)| TableRow {
            rank: table_rank(page, page_size, i),
            title: e.track.title.clone(),
            artist: e.artist.clone(),
            plays: e.plays,
            likes: e.track.likes,
            ratio: format!("{:.2}%", play_like_fraction(e.track.likes, e.plays) * 100.0),
        })
        .collect()
}

/// Split a ranking back into per-artist series, keeping rank order inside
/// each series and the selection's catalog order between series.
pub fn group_by_artist<'a>(
    catalog: &ArtistCatalog,
    selection: &Selection,
    ranking: &'a Ranking
) -> Vec<(String, Vec<&'a RankedEntry>)> {
    catalog.artists()
        .filter(|a| selection.contains(a))
        .map(|artist| {
            let series = ranking.entries.iter()
                .filter(|e| e.artist == artist)
                .collect();
            (artist.to_string(), series)
        })
        .collect()
}

/// Value range of one chart axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Observed extremes of a ranking, used to fit the chart axes.
/// Only positive play counts take part in the play bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartBounds {
    pub plays: Option<(u64, u64)>,
    pub ratio: Option<(f64, f64)>,
}

impl ChartBounds {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a RankedEntry>,
    {
        let mut plays: Option<(u64, u64)> = None;
        let mut ratio: Option<(f64, f64)> = None;
        for entry in entries {
            if entry.plays > 0 {
                plays = Some(match plays {
                    None => (entry.plays, entry.plays),
                    Some((lo, hi)) => (lo.min(entry.plays), hi.max(entry.plays)),
                });
            }
            ratio = Some(match ratio {
                None => (entry.ratio, entry.ratio),
                Some((lo, hi)) => (lo.min(entry.ratio), hi.max(entry.ratio)),
            });
        }
        Self { plays, ratio }
    }

    /// Log-scale play axis with 2% slack on both ends, in log10 units
    pub fn plays_axis(&self) -> Option<AxisRange> {
        self.plays.map(|(lo, hi)| AxisRange {
            min: (lo as f64 * 0.98).log10(),
            max: (hi as f64 * 1.02).log10(),
        })
    }

    /// Ratio axis padded by 5% of the span, never below zero
    pub fn ratio_axis(&self) -> Option<AxisRange> {
        self.ratio.map(|(lo, hi)| {
            let pad = (hi - lo) * 0.05;
            AxisRange { min: (lo - pad).max(0.0), max: hi + pad }
        })
    }
}

/// Mean of `view` over each artist's full catalog, rounded to two
/// decimals. Empty artists average 0; underivable tracks are left out.
pub fn artist_averages(catalog: &ArtistCatalog, view: MetricView) -> Vec<(String, f64)> {
    catalog.iter()
        .map(|(artist, tracks)| {
            let values: Vec<f64> = tracks.iter()
                .filter_map(|t| view_value(t, view).ok())
                .collect();
            let avg = if values.is_empty() {
                0.0
            } else {
                round2(values.iter().sum::<f64>() / values.len() as f64)
            };
            (artist.to_string(), avg)
        })
        .collect()
}
