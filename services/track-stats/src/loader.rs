//!
//! src/loader.rs  Andrew Belles  Oct 18th, 2026
//!
//! Builds the artist catalog from a track source, all-or-nothing,
//! and serializes reload triggers through a single-flight guard.
//! Also holds the dashboard context the engine reads from.
//!

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::ArtistCatalog;
use crate::errors::StatsError;
use crate::fetch::TrackSource;
use crate::highlights::{aggregate, Aggregation, HighlightTrends, Highlights};
use crate::normalize::{normalize_tracks, ValidationPolicy};
use crate::ranking::{rank_selection, top_songs, Ranking};
use crate::types::{artist_key, Selection};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub catalog: ArtistCatalog,
    pub skipped_tracks: usize,
    pub empty_artists: Vec<String>,
}

/// Fetch every artist's stats and build a fresh catalog.
///
/// Any fetch or schema failure aborts the whole load; nothing built so
/// far is returned. Artists left with no valid track are not published.
pub async fn load_catalog<S>(
    source: &S,
    policy: ValidationPolicy
) -> Result<LoadReport, StatsError>
where
    S: TrackSource + ?Sized,
{
    let load_id = Uuid::new_v4();
    async move {
        info!("load.start");
        let names = source.artist_names().await?;
        debug!(artists = names.len(), "load.artists");

        let mut report = LoadReport::default();
        for name in names {
            let payload = source.artist_stats(&name).await?;
            let batch = normalize_tracks(&payload, policy, &name)?;
            report.skipped_tracks += batch.skipped;

            if batch.tracks.is_empty() {
                warn!(artist = %name, "load.artist.empty");
                report.empty_artists.push(name);
                continue;
            }

            debug!(
                artist = %name, tracks = batch.tracks.len(),
                skipped = batch.skipped, "load.artist"
            );
            report.catalog.insert(artist_key(&name), batch.tracks);
        }

        info!(
            artists = report.catalog.len(),
            tracks = report.catalog.track_count(),
            skipped = report.skipped_tracks,
            "load.done"
        );
        Ok(report)
    }
    .instrument(info_span!("load", load_id = %load_id))
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// This trigger ran the load (and any re-runs queued meanwhile)
    Loaded { runs: usize },
    /// A load was in flight; it will run once more when it finishes,
    /// whether it succeeded or failed
    Coalesced,
}

/// Serializes reload triggers. A trigger that lands while a load is in
/// flight queues one extra run; any number of such triggers collapse
/// into that single run.
pub struct Reloader<S: ?Sized> {
    source: Arc<S>,
    policy: ValidationPolicy,
    in_flight: AtomicBool,
    pending: AtomicBool,
    published: RwLock<Arc<ArtistCatalog>>,
}

impl<S> Reloader<S>
where
    S: TrackSource + ?Sized,
{
    pub fn new(source: Arc<S>, policy: ValidationPolicy) -> Self {
        Self {
            source,
            policy,
            in_flight: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            published: RwLock::new(Arc::new(ArtistCatalog::new())),
        }
    }

    /// Last successfully loaded catalog
    pub fn catalog(&self) -> Arc<ArtistCatalog> {
        match self.published.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn publish(&self, catalog: ArtistCatalog) {
        let mut guard = match self.published.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(catalog);
    }

    /// Request a reload. On failure the previously published catalog stays.
    /// The error is returned only when the last queued run failed.
    pub async fn trigger(&self) -> Result<ReloadOutcome, StatsError> {
        self.pending.store(true, Ordering::SeqCst);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("reload.coalesced");
            return Ok(ReloadOutcome::Coalesced);
        }

        let mut runs = 0;
        loop {
            self.pending.store(false, Ordering::SeqCst);
            runs += 1;
            // a failed run still drains the queue; only the last result counts
            let last = match load_catalog(self.source.as_ref(), self.policy).await {
                Ok(report) => {
                    self.publish(report.catalog);
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, run = runs, "reload.failed");
                    Err(e)
                }
            };

            if self.pending.load(Ordering::SeqCst) {
                continue;
            }
            self.in_flight.store(false, Ordering::SeqCst);
            // a trigger may have slipped in between the check and the release
            if self.pending.load(Ordering::SeqCst)
                && !self.in_flight.swap(true, Ordering::SeqCst) {
                continue;
            }
            return last.map(|()| ReloadOutcome::Loaded { runs });
        }
    }
}

/// Controller-owned state the dashboard views are computed from: the
/// current catalog and the previous highlights snapshot for trends.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    catalog: Arc<ArtistCatalog>,
    previous: Option<Highlights>,
}

/// Highlights of the current selection and their movement since the
/// previous refresh, when there was one
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightUpdate {
    pub aggregation: Aggregation,
    pub trends: Option<HighlightTrends>,
}

impl Dashboard {
    pub fn new(catalog: Arc<ArtistCatalog>) -> Self {
        Self { catalog, previous: None }
    }

    pub fn catalog(&self) -> &ArtistCatalog {
        &self.catalog
    }

    /// Swap in a freshly loaded catalog. The trend snapshot is kept so the
    /// next update compares against what was shown before the reload.
    pub fn replace_catalog(&mut self, catalog: Arc<ArtistCatalog>) {
        self.catalog = catalog;
    }

    pub fn ranking(&self, selection: &Selection) -> Ranking {
        rank_selection(&self.catalog, selection)
    }

    pub fn top_songs(&self, selection: &Selection, page: usize, page_size: usize) -> Ranking {
        top_songs(&self.catalog, selection, page, page_size)
    }

    /// Recompute highlights and remember them for the next comparison
    pub fn update_highlights(&mut self, selection: &Selection) -> HighlightUpdate {
        let aggregation = aggregate(selection, &self.catalog);
        let trends = self.previous.as_ref()
            .map(|prev| HighlightTrends::between(&aggregation.highlights, prev));
        self.previous = Some(aggregation.highlights.clone());
        HighlightUpdate { aggregation, trends }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    use super::*;

    #[derive(Default)]
    struct MemorySource {
        artists: Mutex<Vec<(String, Value)>>,
        list_calls: AtomicUsize,
        failures: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl MemorySource {
        fn with(artists: Vec<(&str, Value)>) -> Self {
            Self {
                artists: Mutex::new(
                    artists.into_iter().map(|(n, v)| (n.to_string(), v)).collect()
                ),
                ..Self::default()
            }
        }

        fn set(&self, artists: Vec<(&str, Value)>) {
            *self.artists.lock().unwrap() =
                artists.into_iter().map(|(n, v)| (n.to_string(), v)).collect();
        }
    }

    #[async_trait]
    impl TrackSource for MemorySource {
        async fn artist_names(&self) -> Result<Vec<String>, StatsError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let failing = self.failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(StatsError::SourceUnavailable("artist list down".into()));
            }
            Ok(self.artists.lock().unwrap().iter().map(|(n, _)| n.clone()).collect())
        }

        async fn artist_stats(&self, artist: &str) -> Result<Value, StatsError> {
            let artists: HashMap<String, Value> =
                self.artists.lock().unwrap().iter().cloned().collect();
            artists.get(artist)
                .cloned()
                .ok_or_else(|| StatsError::SourceUnavailable(format!("no {artist}")))
        }
    }

    fn tracks(n: u64) -> Value {
        Value::Array((1..=n).map(|i| json!({
            "Title": format!("track {i}"), "Like": i, "scministats": "1K"
        })).collect())
    }

    #[tokio::test]
    async fn loads_keys_and_skips_in_source_order() -> Result<(), StatsError> {
        let source = MemorySource::with(vec![
            ("okta", tracks(2)),
            ("daft punk", json!([
                {"Title": "x", "Like": 0, "scministats": "1K"},
                {"Title": "y", "Like": 3, "scministats": "2K"}
            ])),
            ("silent", json!([{"Title": "z", "Like": 0, "scministats": "1K"}])),
        ]);
        let report = load_catalog(&source, ValidationPolicy::Truthy).await?;

        let artists: Vec<&str> = report.catalog.artists().collect();
        assert_eq!(artists, vec!["OKTA", "DAFT"]);
        assert_eq!(report.skipped_tracks, 2);
        assert_eq!(report.empty_artists, vec!["silent"]);
        Ok(())
    }

    #[tokio::test]
    async fn derived_key_collisions_keep_the_last_artist() -> Result<(), StatsError> {
        let source = MemorySource::with(vec![
            ("the band", tracks(1)),
            ("other", tracks(1)),
            ("The Weeknd", tracks(3)),
        ]);
        let report = load_catalog(&source, ValidationPolicy::Truthy).await?;
        let artists: Vec<&str> = report.catalog.artists().collect();
        assert_eq!(artists, vec!["THE", "OTHER"]);
        assert_eq!(report.catalog.get("THE").map(|t| t.len()), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_payload_fails_whole_load() {
        let source = Arc::new(MemorySource::with(vec![
            ("okta", tracks(2)),
            ("mira", json!({"Title": "not an array"})),
        ]));
        let result = load_catalog(source.as_ref(), ValidationPolicy::Truthy).await;
        assert!(matches!(result, Err(StatsError::Schema(_))));

        let reloader = Reloader::new(source, ValidationPolicy::Truthy);
        assert!(reloader.trigger().await.is_err());
        assert!(reloader.catalog().is_empty());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_catalog() -> Result<(), StatsError> {
        let source = Arc::new(MemorySource::with(vec![("okta", tracks(2))]));
        let reloader = Reloader::new(source.clone(), ValidationPolicy::Truthy);
        assert_eq!(reloader.trigger().await?, ReloadOutcome::Loaded { runs: 1 });
        assert_eq!(reloader.catalog().track_count(), 2);

        source.set(vec![("okta", tracks(5)), ("mira", json!(null))]);
        assert!(reloader.trigger().await.is_err());
        assert_eq!(reloader.catalog().track_count(), 2);

        source.set(vec![("okta", tracks(5))]);
        reloader.trigger().await?;
        assert_eq!(reloader.catalog().track_count(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn triggers_during_a_load_coalesce_into_one_rerun() -> Result<(), StatsError> {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(MemorySource {
            gate: Some(gate.clone()),
            ..MemorySource::with(vec![("okta", tracks(1))])
        });
        let reloader = Arc::new(Reloader::new(source.clone(), ValidationPolicy::Truthy));

        let first = {
            let reloader = reloader.clone();
            tokio::spawn(async move { reloader.trigger().await })
        };
        while source.list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(reloader.trigger().await?, ReloadOutcome::Coalesced);
        assert_eq!(reloader.trigger().await?, ReloadOutcome::Coalesced);

        // release the first run, then the single queued re-run
        gate.notify_one();
        while source.list_calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        let outcome = first.await.expect("join")?;
        assert_eq!(outcome, ReloadOutcome::Loaded { runs: 2 });
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn queued_rerun_runs_after_a_failed_load() -> Result<(), StatsError> {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(MemorySource {
            gate: Some(gate.clone()),
            failures: AtomicUsize::new(1),
            ..MemorySource::with(vec![("okta", tracks(2))])
        });
        let reloader = Arc::new(Reloader::new(source.clone(), ValidationPolicy::Truthy));

        let first = {
            let reloader = reloader.clone();
            tokio::spawn(async move { reloader.trigger().await })
        };
        while source.list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(reloader.trigger().await?, ReloadOutcome::Coalesced);

        // the first run fails, the queued one must still start
        gate.notify_one();
        while source.list_calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        let outcome = first.await.expect("join")?;
        assert_eq!(outcome, ReloadOutcome::Loaded { runs: 2 });
        assert_eq!(reloader.catalog().track_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_rerun_reports_error_and_releases_guard() -> Result<(), StatsError> {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(MemorySource {
            gate: Some(gate.clone()),
            failures: AtomicUsize::new(2),
            ..MemorySource::with(vec![("okta", tracks(1))])
        });
        let reloader = Arc::new(Reloader::new(source.clone(), ValidationPolicy::Truthy));

        let first = {
            let reloader = reloader.clone();
            tokio::spawn(async move { reloader.trigger().await })
        };
        while source.list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(reloader.trigger().await?, ReloadOutcome::Coalesced);

        gate.notify_one();
        while source.list_calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        gate.notify_one();

        let result = first.await.expect("join");
        assert!(matches!(result, Err(StatsError::SourceUnavailable(_))));
        assert!(reloader.catalog().is_empty());

        // guard is free again: a fresh trigger runs instead of coalescing
        gate.notify_one();
        assert_eq!(reloader.trigger().await?, ReloadOutcome::Loaded { runs: 1 });
        assert_eq!(reloader.catalog().track_count(), 1);
        Ok(())
    }

    #[test]
    fn dashboard_tracks_previous_highlights() {
        let mut catalog = ArtistCatalog::new();
        catalog.insert("OKTA", vec![
            crate::types::TrackRecord::new("a", 10, "1K"),
            crate::types::TrackRecord::new("b", 20, "3K"),
        ]);
        let mut dashboard = Dashboard::new(Arc::new(catalog));
        let all = dashboard.catalog().select_all();

        let first = dashboard.update_highlights(&all);
        assert!(first.trends.is_none());
        assert_eq!(first.aggregation.highlights.total_plays, 4000);

        let only_a = all.clone().with_search("a");
        assert_eq!(dashboard.ranking(&only_a).entries.len(), 1);
        assert_eq!(dashboard.top_songs(&all, 1, 1).entries[0].track.title, "a");

        let second = dashboard.update_highlights(&Selection::default());
        let trends = second.trends.expect("trend after second update");
        assert_eq!(trends.total_plays.change, -4000.0);
        assert_eq!(trends.total_plays.percent, -100.0);
    }
}
