// Signal handling module
//
// - SIGINT / SIGTERM (first):  graceful shutdown, stop accepting and drain
// - SIGINT / SIGTERM (second): force shutdown, drop in-flight connections

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown coordination between the signal task and the server loop
pub struct ShutdownSignal {
    /// Stop accepting and drain (first interrupt)
    pub shutdown: Notify,
    /// Stop waiting for in-flight connections (second interrupt)
    pub force: Notify,
    /// Whether shutdown has been requested
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: Notify::new(),
            force: Notify::new(),
            requested: AtomicBool::new(false),
        }
    }

    /// Request shutdown; a repeated request escalates to a forced one.
    ///
    /// Uses `notify_one` so a request made while the loop is between
    /// `select!` iterations is not lost.
    pub fn trigger(&self) {
        if self.requested.swap(true, Ordering::SeqCst) {
            self.force.notify_one();
        } else {
            self.shutdown.notify_one();
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Register SIGINT/SIGTERM handlers and forward them to `signal`.
///
/// Registration happens before returning so failures surface at startup.
#[cfg(unix)]
pub fn start_signal_handler(signal: Arc<ShutdownSignal>) -> io::Result<()> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut sigterm = unix_signal(SignalKind::terminate())?;
    let mut sigint = unix_signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            logger::log_info(&format!("{name} received"));
            signal.trigger();
        }
    });

    Ok(())
}

/// Non-unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(signal: Arc<ShutdownSignal>) -> io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            logger::log_info("Ctrl+C received");
            signal.trigger();
        }
    });

    Ok(())
}
