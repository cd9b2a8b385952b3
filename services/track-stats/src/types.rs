//!
//! src/types.rs  Andrew Belles  Oct 18th, 2026
//!
//! Track records, selections and the ranked/annotated views the
//! engine hands to whatever draws the dashboard
//!

use std::collections::BTreeSet;

use serde::Serialize;

/// A validated track as published by an artist's stats file.
/// Field names on the wire follow the scraped export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Like")]
    pub likes: u64,
    #[serde(rename = "scministats")]
    pub scministats: String,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "scbuttonrepost", skip_serializing_if = "Option::is_none")]
    pub reposts: Option<String>,
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl TrackRecord {
    pub fn new(title: impl Into<String>, likes: u64, scministats: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            likes,
            scministats: scministats.into(),
            url: None,
            date: None,
            reposts: None,
            comments: None,
        }
    }

    /// Case-insensitive substring match on the title; an empty term matches
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Track paired with the catalog key of the artist it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedTrack {
    pub artist: String,
    pub track: TrackRecord,
}

/// Output row of every ranking pass.
/// `ratio` is the like/play percentage rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub track: TrackRecord,
    pub artist: String,
    pub plays: u64,
    pub ratio: f64,
}

/// Artists toggled on in the dashboard plus the free-text title filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub artists: BTreeSet<String>,
    pub search_term: String,
}

impl Selection {
    pub fn new<I, S>(artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            artists: artists.into_iter().map(Into::into).collect(),
            search_term: String::new(),
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn contains(&self, artist: &str) -> bool {
        self.artists.contains(artist)
    }

    pub fn matches(&self, track: &TrackRecord) -> bool {
        track.matches_search(&self.search_term)
    }
}

/// Catalog key for an artist name: first word, uppercased
pub fn artist_key(name: &str) -> String {
    name.split(' ')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_key_takes_first_word() {
        assert_eq!(artist_key("daft punk"), "DAFT");
        assert_eq!(artist_key("Okta"), "OKTA");
        assert_eq!(artist_key(""), "");
    }

    #[test]
    fn search_is_case_insensitive_on_title() {
        let track = TrackRecord::new("Midnight Drive", 10, "1K");
        assert!(track.matches_search(""));
        assert!(track.matches_search("NIGHT"));
        assert!(!track.matches_search("noon"));
    }

    #[test]
    fn serializes_with_export_field_names() {
        let mut track = TrackRecord::new("Song", 5, "2K");
        track.url = Some("https://example.test/song".to_string());
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["Title"], "Song");
        assert_eq!(json["Like"], 5);
        assert_eq!(json["URL"], "https://example.test/song");
        assert!(json.get("Date").is_none());
    }
}
