// Configuration module entry point
// Loads layered configuration and holds the immutable runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, RoutesConfig, ServerConfig, SiteConfig,
};

/// Prefix for environment overrides, e.g. `SPA_SERVE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SPA_SERVE";

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// A single `key = value` override applied above file and environment sources
pub type ConfigOverride = (&'static str, config::Value);

impl Config {
    /// Load configuration from specified file path (with or without extension).
    ///
    /// Precedence, lowest first: defaults, file, environment, `overrides`.
    pub fn load_from(
        config_path: &str,
        overrides: Vec<ConfigOverride>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("site.root", "dist")?
            .set_default("site.spa_fallback", false)?
            .set_default("site.fallback_document", "index.html")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default(
                "http.server_name",
                concat!("spa-serve/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.cors", "off")?
            .set_default("http.directory_listing", true)?
            .set_default("http.max_body_size", 10_485_760)?; // 10MB

        for (key, value) in overrides {
            builder = builder.set_override(key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        // Bracket bare IPv6 literals so "::" parses
        let host = if self.server.host.contains(':') && !self.server.host.starts_with('[') {
            format!("[{}]", self.server.host)
        } else {
            self.server.host.clone()
        };
        format!("{host}:{}", self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
