//!
//! src/catalog.rs  Andrew Belles  Oct 18th, 2026
//!
//! Insertion-ordered map of artist key -> validated tracks
//!

use crate::types::{Selection, TaggedTrack, TrackRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistCatalog {
    entries: Vec<(String, Vec<TrackRecord>)>,
}

impl ArtistCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-inserting a key replaces its tracks but keeps its position
    pub fn insert(&mut self, artist: impl Into<String>, tracks: Vec<TrackRecord>) {
        let artist = artist.into();
        match self.entries.iter_mut().find(|(k, _)| *k == artist) {
            Some(entry) => entry.1 = tracks,
            None => self.entries.push((artist, tracks)),
        }
    }

    pub fn get(&self, artist: &str) -> Option<&[TrackRecord]> {
        self.entries.iter()
            .find(|(k, _)| k == artist)
            .map(|(_, v)| v.as_slice())
    }

    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TrackRecord])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn track_count(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    /// Selection that turns every artist on, as the dashboard starts
    pub fn select_all(&self) -> Selection {
        Selection::new(self.artists())
    }

    /// Tracks of the selected artists, in catalog order then file order.
    /// Selected names missing from the catalog are ignored.
    pub fn selected<'a>(&'a self, selection: &'a Selection) ->
        impl Iterator<Item = (&'a str, &'a TrackRecord)> + 'a {
        self.entries.iter()
            .filter(move |(k, _)| selection.contains(k))
            .flat_map(|(k, v)| v.iter().map(move |t| (k.as_str(), t)))
    }

    pub fn tagged(&self, selection: &Selection) -> Vec<TaggedTrack> {
        self.selected(selection)
            .map(|(artist, track)| TaggedTrack {
                artist: artist.to_string(),
                track: track.clone(),
            })
            .collect()
    }
}
