//!
//! src/refresh.rs  Andrew Belles  Oct 18th, 2026
//!
//! Polling refresh loop: reloads the catalog on an interval through
//! the single-flight reloader and logs highlights with their trends
//!

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::StatsError;
use crate::fetch::TrackSource;
use crate::loader::{Dashboard, ReloadOutcome, Reloader};
use crate::types::Selection;

pub struct Refresher<S: ?Sized> {
    reloader: Arc<Reloader<S>>,
    dashboard: Dashboard,
    selection: Option<Selection>,
    period: Duration,
    shutdown: CancellationToken
}

impl<S> Refresher<S>
where
    S: TrackSource + ?Sized,
{
    /// `selection` of `None` follows every artist in the latest catalog
    pub fn new(reloader: Arc<Reloader<S>>, selection: Option<Selection>, period: Duration) -> Self {
        Self {
            reloader,
            dashboard: Dashboard::default(),
            selection,
            period,
            shutdown: CancellationToken::new()
        }
    }

    pub fn shutdown(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// One refresh: reload, then recompute highlights when a load ran.
    /// A failed load keeps the previous catalog on display.
    pub async fn tick(&mut self) -> Result<ReloadOutcome, StatsError> {
        let outcome = match self.reloader.trigger().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "refresh.load.failed");
                return Err(e);
            }
        };
        if outcome == ReloadOutcome::Coalesced {
            return Ok(outcome);
        }

        self.dashboard.replace_catalog(self.reloader.catalog());
        let selection = self.selection.clone()
            .unwrap_or_else(|| self.dashboard.catalog().select_all());
        let update = self.dashboard.update_highlights(&selection);
        let h = &update.aggregation.highlights;

        info!(
            total_plays = h.total_plays,
            popular_track = %h.popular_track,
            max_plays = h.max_plays,
            avg_likes = h.avg_likes,
            recent_activity = %h.recent_activity,
            total_reposts = h.total_reposts,
            total_comments = h.total_comments,
            excluded = update.aggregation.excluded,
            "refresh.highlights"
        );
        if let Some(trends) = &update.trends {
            info!(
                plays = %trends.total_plays.label(),
                avg_likes = %trends.avg_likes.label(),
                reposts = %trends.total_reposts.label(),
                comments = %trends.total_comments.label(),
                popular_changed = trends.popular_track_changed,
                "refresh.trends"
            );
        }
        Ok(outcome)
    }

    pub async fn run(mut self) -> Result<(), StatsError> {
        info!(period_ms = self.period.as_millis() as u64, "refresh.start");

        let shutdown = self.shutdown.clone();
        let trigger = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(msg = "stopping refresh loop", "refresh.signal");
                shutdown.cancel();
            }
        });

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let token = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(reason = "shutdown token", "refresh.stop");
                    break;
                }
                _ = ticker.tick() => {
                    // failures are logged in tick; the next tick retries
                    let _ = self.tick().await;
                }
            }
        }

        trigger.abort();
        info!("refresh.exit");
        Ok(())
    }
}
