//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

const LEVEL_ERROR: u8 = 0;
const LEVEL_WARN: u8 = 1;
const LEVEL_INFO: u8 = 2;

/// Most verbose level currently written
static MAX_LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = match config.logging.level.to_ascii_lowercase().as_str() {
        "error" => LEVEL_ERROR,
        "warn" | "warning" => LEVEL_WARN,
        _ => LEVEL_INFO,
    };
    MAX_LEVEL.store(level, Ordering::Relaxed);

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: u8) -> bool {
    level <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Write lifecycle message to the info target
fn write_info(message: &str) {
    if !enabled(LEVEL_INFO) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically; not subject to `logging.level`
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn log_server_start(addr: &SocketAddr, serve_root: &Path, config: &Config) {
    write_info("======================================");
    write_info(&format!(
        "Serving {} at http://{addr}",
        serve_root.display()
    ));
    if config.site.spa_fallback {
        write_info(&format!(
            "SPA fallback: on (routes without a file extension serve /{})",
            config.site.fallback_document.trim_start_matches('/')
        ));
    } else {
        write_info("SPA fallback: off");
    }
    write_info(&format!("CORS: {}", config.http.cors.as_str()));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    if enabled(LEVEL_ERROR) {
        write_error(&format!("[{}] [ERROR] Failed to serve connection: {err}", timestamp()));
    }
}

pub fn log_error(message: &str) {
    if enabled(LEVEL_ERROR) {
        write_error(&format!("[{}] [ERROR] {message}", timestamp()));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LEVEL_WARN) {
        write_error(&format!("[{}] [WARN] {message}", timestamp()));
    }
}

pub fn log_info(message: &str) {
    write_info(&format!("[{}] [INFO] {message}", timestamp()));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_access(&entry.render(format));
}

pub fn log_shutdown_requested(in_flight: usize, timeout_secs: u64) {
    log_info(&format!(
        "Shutting down: waiting up to {timeout_secs}s for {in_flight} connection(s), \
         interrupt again to force"
    ));
}

pub fn log_shutdown_complete(forced: bool) {
    if forced {
        log_warning("Forced shutdown, in-flight connections dropped");
    } else {
        log_info("Server stopped");
    }
}
