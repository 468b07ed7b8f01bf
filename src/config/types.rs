// Configuration types
// One struct per config file section; defaults live in `Config::load_from`

use serde::Deserialize;
use std::path::PathBuf;

use crate::http::cors::CorsMode;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
}

/// `[server]`: where to listen
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address; `0.0.0.0` or `::` for every interface
    pub host: String,
    pub port: u16,
    /// Tokio worker threads; `None` uses one per core
    pub workers: Option<usize>,
}

/// `[site]`: what gets served and how unmatched application routes are treated
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Serve root, fixed for the lifetime of the process
    pub root: PathBuf,
    /// Rewrite undotted GET routes to `fallback_document`
    pub spa_fallback: bool,
    /// Relative to `root`
    pub fallback_document: String,
}

/// `[routes]`
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Tried in order when a directory URL is requested
    pub index_files: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            index_files: ["index.html", "index.htm"].map(String::from).to_vec(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `error`, `warn` or `info`
    pub level: String,
    pub access_log: bool,
    /// `combined`, `common`, `json`, or a `$variable` pattern
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Append access lines here instead of stdout
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Append warnings and errors here instead of stderr
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    String::from("combined")
}

/// `[performance]`: connection timeouts and limits, all in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Idle time after which a kept-alive connection is closed; 0 closes
    /// each connection after one response
    pub keep_alive_timeout: u64,
    /// Request head must arrive within this; 0 disables
    pub read_timeout: u64,
    /// Longest a response write may wait on a client that stopped reading;
    /// 0 disables
    pub write_timeout: u64,
    /// Connections beyond this are closed right after accept
    pub max_connections: Option<u64>,
    /// Drain window after the first interrupt
    pub shutdown_timeout: u64,
}

/// `[http]`: response behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` header
    pub server_name: String,
    pub cors: CorsMode,
    /// Render an HTML index for directories without an index document
    pub directory_listing: bool,
    /// Largest accepted `Content-Length`, in bytes
    pub max_body_size: u64,
}
