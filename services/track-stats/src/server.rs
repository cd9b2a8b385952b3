//!
//! src/server.rs  Andrew Belles  Oct 18th, 2026
//!
//! Artist data server: lists the available stats files under
//! /api/artists and serves the dashboard and artist files statically
//!

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::errors::StatsError;
use crate::fetch::list_artists;

#[derive(Clone)]
struct ServerState {
    artists_dir: Arc<PathBuf>,
}

/// GET /api/artists
async fn artists(State(state): State<ServerState>) -> Response {
    match list_artists(&state.artists_dir).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => {
            error!(error = %e, dir = %state.artists_dir.display(), "server.artists.read");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Unable to read artists directory" })),
            ).into_response()
        }
    }
}

pub fn router(cfg: &ServerConfig) -> Router {
    let state = ServerState { artists_dir: Arc::new(cfg.artists_dir.clone()) };

    Router::new()
        .route("/api/artists", get(artists))
        .nest_service("/artists", ServeDir::new(&cfg.artists_dir))
        .fallback_service(ServeDir::new(&cfg.static_root))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve on an already bound listener until the process is stopped
pub async fn serve(listener: TcpListener, cfg: &ServerConfig) -> Result<(), StatsError> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, root = %cfg.static_root.display(), "server.start");
    axum::serve(listener, router(cfg))
        .await
        .map_err(|e| StatsError::Http(format!("server error: {e}")))
}

pub async fn bind(cfg: &ServerConfig) -> Result<TcpListener, StatsError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| StatsError::Http(format!("failed to bind to {addr}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_source_url, HttpConfig};
    use crate::fetch::{HttpSource, TrackSource};
    use crate::loader::load_catalog;
    use crate::normalize::ValidationPolicy;

    async fn spawn_server(cfg: ServerConfig) -> Result<HttpSource, StatsError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = serve(listener, &cfg).await;
        });
        let source = parse_source_url(&format!("http://{addr}/"))?;
        HttpSource::new(&HttpConfig::default(), &source)
    }

    fn write_artist(dir: &std::path::Path, name: &str, body: &str) -> std::io::Result<()> {
        std::fs::write(dir.join(format!("{name} stats.json")), body)
    }

    #[tokio::test]
    async fn loads_catalog_end_to_end_over_http() -> Result<(), StatsError> {
        let root = tempfile::tempdir()?;
        let artists_dir = root.path().join("artists");
        std::fs::create_dir(&artists_dir)?;
        std::fs::write(root.path().join("index.html"), "<html></html>")?;
        write_artist(&artists_dir, "okta", r#"[
            {"Title": "One", "Like": 50, "scministats": "1K"},
            {"Title": "Two", "Like": 2000, "scministats": "1K"}
        ]"#)?;
        write_artist(&artists_dir, "daft punk", r#"[
            {"Title": "Three", "Like": 7, "scministats": "700"}
        ]"#)?;

        let cfg = ServerConfig {
            port: 0,
            static_root: root.path().to_path_buf(),
            artists_dir,
        };
        let source = spawn_server(cfg).await?;

        assert_eq!(source.artist_names().await?, vec!["daft punk", "okta"]);

        let report = load_catalog(&source, ValidationPolicy::Truthy).await?;
        let artists: Vec<&str> = report.catalog.artists().collect();
        assert_eq!(artists, vec!["DAFT", "OKTA"]);
        assert_eq!(report.catalog.get("OKTA").map(|t| t.len()), Some(2));

        let index = source.http.get(source.base.join("index.html").unwrap())
            .send()
            .await?;
        assert!(index.status().is_success());
        Ok(())
    }

    #[tokio::test]
    async fn missing_artist_file_aborts_load() -> Result<(), StatsError> {
        let root = tempfile::tempdir()?;
        let cfg = ServerConfig {
            port: 0,
            static_root: root.path().to_path_buf(),
            artists_dir: root.path().join("artists"),
        };
        let source = spawn_server(cfg).await?;

        // artists dir does not exist: listing fails with a 500
        let err = source.artist_names().await.unwrap_err();
        assert!(matches!(err, StatsError::SourceUnavailable(_)));

        let err = source.artist_stats("ghost").await.unwrap_err();
        assert!(matches!(err, StatsError::SourceUnavailable(_)));
        Ok(())
    }

    #[tokio::test]
    async fn non_array_payload_fails_the_whole_load() -> Result<(), StatsError> {
        let root = tempfile::tempdir()?;
        let artists_dir = root.path().join("artists");
        std::fs::create_dir(&artists_dir)?;
        write_artist(&artists_dir, "alpha", r#"[{"Title": "A", "Like": 1, "scministats": "9"}]"#)?;
        write_artist(&artists_dir, "beta", r#"{"tracks": []}"#)?;

        let cfg = ServerConfig {
            port: 0,
            static_root: root.path().to_path_buf(),
            artists_dir,
        };
        let source = spawn_server(cfg).await?;

        let result = load_catalog(&source, ValidationPolicy::Truthy).await;
        assert!(matches!(result, Err(StatsError::Schema(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_stats_file_is_a_schema_error() -> Result<(), StatsError> {
        let root = tempfile::tempdir()?;
        let artists_dir = root.path().join("artists");
        std::fs::create_dir(&artists_dir)?;
        write_artist(&artists_dir, "okta", "[{\"Title\": ")?;

        let cfg = ServerConfig {
            port: 0,
            static_root: root.path().to_path_buf(),
            artists_dir,
        };
        let source = spawn_server(cfg).await?;

        let err = source.artist_stats("okta").await.unwrap_err();
        assert!(matches!(err, StatsError::Schema(_)));
        Ok(())
    }
}
