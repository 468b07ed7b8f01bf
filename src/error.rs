//! Startup error types
//!
//! Everything that can stop the server before it starts accepting
//! connections. Per-request failures never surface here; they become HTTP
//! status codes in the file responder.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StartupError {
    /// Configuration file or environment could not be parsed
    Config(config::ConfigError),
    /// Serve root does not exist
    MissingServeRoot(PathBuf),
    /// Serve root exists but is not a directory
    ServeRootNotDirectory(PathBuf),
    /// `server.host`/`server.port` do not form a socket address
    InvalidAddress(String),
    /// Listening socket could not be created or bound
    Bind(SocketAddr, io::Error),
    /// Log files could not be opened
    Logger(io::Error),
    /// Tokio runtime could not be built
    Runtime(io::Error),
    /// SIGINT/SIGTERM handlers could not be registered
    Signal(io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Invalid configuration: {e}"),
            Self::MissingServeRoot(path) => {
                write!(f, "{} directory not found!", path.display())
            }
            Self::ServeRootNotDirectory(path) => {
                write!(f, "{} is not a directory", path.display())
            }
            Self::InvalidAddress(msg) => f.write_str(msg),
            Self::Bind(addr, e) => write!(f, "Failed to bind {addr}: {e}"),
            Self::Logger(e) => write!(f, "Failed to open log file: {e}"),
            Self::Runtime(e) => write!(f, "Failed to build Tokio runtime: {e}"),
            Self::Signal(e) => write!(f, "Failed to install signal handlers: {e}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bind(_, e) | Self::Logger(e) | Self::Runtime(e) | Self::Signal(e) => Some(e),
            Self::MissingServeRoot(_)
            | Self::ServeRootNotDirectory(_)
            | Self::InvalidAddress(_) => None,
        }
    }
}

impl From<config::ConfigError> for StartupError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}
