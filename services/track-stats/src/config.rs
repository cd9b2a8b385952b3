//!
//! src/config.rs  Andrew Belles  Oct 18th, 2026
//!
//! Environment driven configuration for the loader, the artist
//! data server, the refresh loop and the logger
//!

use std::{path::PathBuf, time};

use url::Url;

use crate::errors::StatsError;
use crate::normalize::ValidationPolicy;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const DEFAULT_SOURCE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REFRESH_MS: u64 = 30_000;
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Suffix every per-artist stats file carries
pub const STATS_SUFFIX: &str = " stats.json";

/// Reads an env var, falling back to `default` when unset, empty
/// or unparseable
fn env_or<T: std::str::FromStr>(s: &str, default: T) -> T {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<T>().unwrap_or(default),
        _ => default,
    }
}

fn env_string(s: &str, default: &str) -> String {
    match std::env::var(s) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Ensures that url is http(s)
fn ensure_http(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL must be http or https (got {other}): {url}")),
    }
}

fn ensure_host(url: &Url) -> Result<(), String> {
    match url.host_str() {
        Some(_) => Ok(()),
        None => Err(format!("URL missing host: {url}")),
    }
}

///
/// Where the artist list and the per-artist stats files are fetched from
///
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: Url,
}

pub fn parse_source_url(raw: &str) -> Result<SourceConfig, StatsError> {
    let mut base_url = Url::parse(raw)
        .map_err(|e| StatsError::Config(format!("STATS_SOURCE_URL invalid {e}")))?;

    ensure_http(&base_url).map_err(StatsError::Config)?;
    ensure_host(&base_url).map_err(StatsError::Config)?;

    // ensure trailing slash so joins stay under the base path
    if !base_url.path().ends_with('/') {
        let mut path = base_url.path().to_string();
        path.push('/');
        base_url.set_path(&path);
    }

    Ok( SourceConfig { base_url } )
}

fn build_source() -> Result<SourceConfig, StatsError> {
    parse_source_url(&env_string("STATS_SOURCE_URL", DEFAULT_SOURCE_URL))
}

///
/// Configuration for Http timeouts, etc. Loads are never retried.
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
        }
    }
}

///
/// Configuration for the artist data server
///
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_root: PathBuf,   // served as-is, dashboard assets live here
    pub artists_dir: PathBuf,   // holds the "<artist> stats.json" files
}

impl Default for ServerConfig {
    fn default() -> Self {
        let static_root = PathBuf::from(".");
        Self {
            port: DEFAULT_PORT,
            artists_dir: static_root.join("artists"),
            static_root,
        }
    }
}

fn build_server() -> ServerConfig {
    let static_root = PathBuf::from(env_string("STATS_STATIC_ROOT", "."));
    let artists_dir = match std::env::var("STATS_ARTISTS_DIR") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v),
        _ => static_root.join("artists"),
    };
    ServerConfig {
        port: env_or("STATS_PORT", DEFAULT_PORT),
        static_root,
        artists_dir,
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: time::Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval: time::Duration::from_millis(DEFAULT_REFRESH_MS) }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub validation: ValidationPolicy,
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { validation: ValidationPolicy::default(), page_size: DEFAULT_PAGE_SIZE }
    }
}

fn build_engine() -> Result<EngineConfig, StatsError> {
    let validation = match std::env::var("STATS_VALIDATION") {
        Ok(v) if !v.trim().is_empty() => ValidationPolicy::parse(&v)
            .ok_or_else(|| StatsError::Config(
                format!("STATS_VALIDATION must be truthy or presence, got {v}")
            ))?,
        _ => ValidationPolicy::default(),
    };
    let page_size = env_or("STATS_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1);
    Ok( EngineConfig { validation, page_size } )
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<LogFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,track_stats=debug,reqwest=warn,tower_http=info".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true,
        }
    }
}

fn build_logging() -> LoggingConfig {
    let mut logging = LoggingConfig::default();
    if let Some(format) = std::env::var("STATS_LOG_FORMAT").ok().as_deref().and_then(LogFormat::parse) {
        logging.format = format;
    }
    logging
}

///
/// AppConfig which holds everything the loader, server and refresher need
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, StatsError> {
    dotenvy::dotenv().ok();

    let source  = build_source()?;
    let http    = HttpConfig::default();
    let server  = build_server();
    let refresh = RefreshConfig {
        interval: time::Duration::from_millis(env_or("STATS_REFRESH_MS", DEFAULT_REFRESH_MS).max(1)),
    };
    let engine  = build_engine()?;
    let logging = build_logging();

    Ok( AppConfig { source, http, server, refresh, engine, logging } )
}
