//!
//! src/fetch.rs  Andrew Belles  Oct 18th, 2026
//!
//! Sources the artist list and the raw per-artist stats payloads,
//! either over HTTP from the data server or straight from disk.
//! Requests are never retried; any failure surfaces to the loader.
//!

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, header, redirect};
use serde_json::Value;
use url::Url;

use crate::config::{HttpConfig, SourceConfig, STATS_SUFFIX};
use crate::errors::StatsError;

/// Where a catalog load reads from
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Artist names, without the stats file suffix
    async fn artist_names(&self) -> Result<Vec<String>, StatsError>;

    /// Decoded stats payload of one artist, unvalidated
    async fn artist_stats(&self, artist: &str) -> Result<Value, StatsError>;
}

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, StatsError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .build()
        .map_err(|e| StatsError::Http(format!("build client: {e}")))
}

pub fn stats_file_name(artist: &str) -> String {
    format!("{artist}{STATS_SUFFIX}")
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    pub http: Client,
    pub base: Url
}

impl HttpSource {
    pub fn new(http_config: &HttpConfig, cfg: &SourceConfig) -> Result<Self, StatsError> {
        let http = base_client(http_config)?;
        Ok( Self { http, base: cfg.base_url.clone() } )
    }

    /// GET /api/artists
    pub fn artists_url(&self) -> Result<Url, StatsError> {
        self.base.join("api/artists")
            .map_err(|e| StatsError::Config(format!("artists url: {e}")))
    }

    /// GET /artists/{artist} stats.json
    pub fn stats_url(&self, artist: &str) -> Result<Url, StatsError> {
        let mut url = self.base.join("artists/")
            .map_err(|e| StatsError::Config(format!("stats url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StatsError::Config(format!("base url cannot hold paths: {}", self.base)))?
            .pop_if_empty()
            .push(&stats_file_name(artist));
        Ok(url)
    }

    async fn get_json(&self, url: Url, what: &str) -> Result<Value, StatsError> {
        let response = self.http.get(url.clone())
            .send()
            .await
            .map_err(|e| StatsError::SourceUnavailable(format!("{what}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::SourceUnavailable(
                format!("failed to load {what} - status {status}")
            ));
        }

        response.json::<Value>()
            .await
            .map_err(|e| if e.is_decode() {
                StatsError::Schema(format!("failed to parse JSON data from {what}: {e}"))
            } else {
                StatsError::SourceUnavailable(format!("{what}: {e}"))
            })
    }
}

#[async_trait]
impl TrackSource for HttpSource {
    async fn artist_names(&self) -> Result<Vec<String>, StatsError> {
        let value = self.get_json(self.artists_url()?, "artist list").await?;
        serde_json::from_value::<Vec<String>>(value)
            .map_err(|e| StatsError::Schema(format!("artist list: {e}")))
    }

    async fn artist_stats(&self, artist: &str) -> Result<Value, StatsError> {
        let url = self.stats_url(artist)?;
        self.get_json(url, &stats_file_name(artist)).await
    }
}

/// Reads `<artist> stats.json` files from a local directory
#[derive(Clone, Debug)]
pub struct DirSource {
    pub root: PathBuf
}

impl DirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

/// Names of the artists with a stats file in `dir`, sorted
pub async fn list_artists(dir: &Path) -> Result<Vec<String>, StatsError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        if let Some(name) = file_name.to_str().and_then(|f| f.strip_suffix(STATS_SUFFIX)) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl TrackSource for DirSource {
    async fn artist_names(&self) -> Result<Vec<String>, StatsError> {
        list_artists(&self.root).await
            .map_err(|e| StatsError::SourceUnavailable(
                format!("read {}: {e}", self.root.display())
            ))
    }

    async fn artist_stats(&self, artist: &str) -> Result<Value, StatsError> {
        let path = self.root.join(stats_file_name(artist));
        let bytes = tokio::fs::read(&path).await
            .map_err(|e| StatsError::SourceUnavailable(format!("read {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StatsError::Schema(format!("failed to parse JSON data from {}: {e}", path.display())))
    }
}
