// Application state module
// Immutable per-process state shared by every connection

use std::path::PathBuf;

use super::types::Config;
use crate::error::StartupError;
use crate::logger::LogFormat;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical serve root, resolved once at startup
    pub serve_root: PathBuf,
    pub access_log_format: LogFormat,
}

impl AppState {
    /// Resolve the serve root and build the shared state.
    ///
    /// Fails when the configured root is missing or is not a directory; this
    /// must run before any socket is bound.
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let root = &config.site.root;
        let serve_root = root
            .canonicalize()
            .map_err(|_| StartupError::MissingServeRoot(root.clone()))?;
        if !serve_root.is_dir() {
            return Err(StartupError::ServeRootNotDirectory(root.clone()));
        }

        let access_log_format = LogFormat::parse(&config.logging.access_log_format);

        Ok(Self {
            config,
            serve_root,
            access_log_format,
        })
    }

    #[inline]
    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
