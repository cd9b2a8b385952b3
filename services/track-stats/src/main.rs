//!
//! src/main.rs  Andrew Belles  Oct 18th, 2026
//!
//! Entry point: serves the artist data, prints a one-shot report,
//! or keeps the catalog refreshed and logs highlights
//!
//!

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use serde::Serialize;

use track_stats::{
    config::{self, AppConfig},
    fetch::{DirSource, HttpSource, TrackSource},
    highlights::{aggregate, Highlights},
    loader::{load_catalog, Reloader},
    logging,
    metrics::MetricView,
    ranking::{artist_averages, table_rows, top_songs, TableRow},
    refresh::Refresher,
    server,
    types::{artist_key, Selection},
    StatsError,
};

#[derive(Parser, Debug)]
#[command(name = "track-stats")]
#[command(about = "Per-track engagement statistics across artists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve /api/artists and the dashboard files
    Serve {
        #[arg(long, env = "STATS_PORT")]
        port: Option<u16>,
    },
    /// Load once and print highlights and a page of top songs as JSON
    Report {
        #[command(flatten)]
        select: SelectArgs,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// Per-artist averages of this metric (ratio, plays, likes)
        #[arg(long, default_value = "ratio")]
        view: String,
    },
    /// Reload on an interval and log highlights with their trends
    Watch {
        #[command(flatten)]
        select: SelectArgs,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(clap::Args, Debug)]
struct SelectArgs {
    /// Artists to include, comma separated; all when omitted
    #[arg(long, value_delimiter = ',')]
    artists: Vec<String>,
    /// Case-insensitive title filter
    #[arg(long, default_value = "")]
    search: String,
    /// Read stats files from this directory instead of the HTTP source
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl SelectArgs {
    fn selection(&self) -> Option<Selection> {
        if self.artists.is_empty() {
            return None;
        }
        let artists = self.artists.iter().map(|a| artist_key(a.trim()));
        Some(Selection::new(artists).with_search(self.search.clone()))
    }

    fn source(&self, cfgs: &AppConfig) -> Result<Arc<dyn TrackSource>, StatsError> {
        let source: Arc<dyn TrackSource> = match &self.dir {
            Some(dir) => Arc::new(DirSource::new(dir)),
            None => Arc::new(HttpSource::new(&cfgs.http, &cfgs.source)?),
        };
        Ok(source)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    highlights: Highlights,
    top_songs: Vec<TableRow>,
    averages: Vec<(String, f64)>,
    skipped_tracks: usize,
    excluded_tracks: usize,
}

#[tokio::main]
async fn main() -> Result<(), StatsError> {
    let cli  = Cli::parse();
    let cfgs = config::load_config()?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service = "track-stats",
        version = %env!("CARGO_PKG_VERSION"),
        "starting"
    );

    match cli.command {
        Command::Serve { port } => {
            let mut server_cfg = cfgs.server.clone();
            if let Some(port) = port {
                server_cfg.port = port;
            }
            let listener = server::bind(&server_cfg).await?;
            server::serve(listener, &server_cfg).await
        }
        Command::Report { select, page, page_size, view } => {
            let view = MetricView::parse(&view)
                .ok_or_else(|| StatsError::Config(format!("unknown view {view}")))?;
            let page_size = page_size.unwrap_or(cfgs.engine.page_size);

            let source = select.source(&cfgs)?;
            let report = load_catalog(source.as_ref(), cfgs.engine.validation).await?;
            let catalog = &report.catalog;
            let selection = select.selection()
                .unwrap_or_else(|| catalog.select_all().with_search(select.search.clone()));

            let aggregation = aggregate(&selection, catalog);
            let table = top_songs(catalog, &selection, page, page_size);
            let out = Report {
                highlights: aggregation.highlights,
                top_songs: table_rows(&table, page, page_size),
                averages: artist_averages(catalog, view),
                skipped_tracks: report.skipped_tracks,
                excluded_tracks: aggregation.excluded,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Command::Watch { select, interval_ms } => {
            let period = interval_ms
                .map(Duration::from_millis)
                .unwrap_or(cfgs.refresh.interval);
            let source = select.source(&cfgs)?;
            let reloader = Arc::new(Reloader::new(source, cfgs.engine.validation));
            Refresher::new(reloader, select.selection(), period).run().await
        }
    }
}
