// Server loop module
// Accepts connections until shutdown is requested, then drains them

use hyper_util::server::graceful::GracefulShutdown;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::ShutdownSignal;
use crate::config::AppState;
use crate::logger;

/// Pause after a failed `accept` so fd exhaustion does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How the server loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Every in-flight connection finished
    Graceful,
    /// `performance.shutdown_timeout` expired first
    TimedOut,
    /// A second interrupt arrived while draining
    Forced,
}

/// Run the accept loop on `listener` until `signal` requests shutdown.
///
/// The listener is closed as soon as shutdown starts; connections already
/// accepted are told to finish their current request and are awaited for up
/// to `performance.shutdown_timeout` seconds.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: Arc<ShutdownSignal>,
) -> ShutdownKind {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &graceful,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }

            () = signal.shutdown.notified() => break,
        }
    }

    // Stop accepting new connections
    drop(listener);

    let timeout_secs = state.config.performance.shutdown_timeout;
    logger::log_shutdown_requested(active_connections.load(Ordering::SeqCst), timeout_secs);

    let kind = tokio::select! {
        () = graceful.shutdown() => ShutdownKind::Graceful,
        () = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
            logger::log_warning(&format!(
                "Shutdown timeout after {timeout_secs}s, {} connection(s) still open",
                active_connections.load(Ordering::SeqCst)
            ));
            ShutdownKind::TimedOut
        }
        () = signal.force.notified() => ShutdownKind::Forced,
    };

    logger::log_shutdown_complete(kind == ShutdownKind::Forced);
    kind
}
