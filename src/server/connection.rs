// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::idle::{self, Activity, IdleLimits, Stall, TrackedStream};
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Admit a freshly accepted stream, or close it when
/// `performance.max_connections` is already reached.
///
/// `conn_counter` counts live connections and is decremented by the
/// connection task when it ends.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    // Reserve a slot before checking so concurrent accepts cannot overshoot
    let in_use = conn_counter.fetch_add(1, Ordering::SeqCst);

    let limit = state
        .config
        .performance
        .max_connections
        .map(|max| usize::try_from(max).unwrap_or(usize::MAX));
    if limit.is_some_and(|max| in_use >= max) {
        conn_counter.fetch_sub(1, Ordering::SeqCst);
        logger::log_warning(&format!(
            "Connection limit reached ({in_use} open), closing connection from {peer_addr}"
        ));
        drop(stream);
        return;
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        graceful,
    );
}

/// Serve one connection in a spawned task.
///
/// `read_timeout` bounds how long a request head may take to arrive.
/// `write_timeout` bounds how long a response write may wait on a peer that
/// stopped reading, and `keep_alive_timeout` how long the connection may sit
/// with no bytes moving. Transfers that keep progressing run to completion.
/// Dropping a connection never affects the listener or other connections.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    let perf = &state.config.performance;
    let limits = IdleLimits::from_secs(perf.write_timeout, perf.keep_alive_timeout);
    let activity = Arc::new(Activity::new());
    let io = TokioIo::new(TrackedStream::new(stream, Arc::clone(&activity)));

    let mut builder = http1::Builder::new();
    builder.timer(TokioTimer::new());
    builder.keep_alive(perf.keep_alive_timeout > 0);
    if perf.read_timeout > 0 {
        builder.header_read_timeout(Duration::from_secs(perf.read_timeout));
    }

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            handler::handle_request(req, Arc::clone(&service_state), peer_addr)
        }),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        tokio::select! {
            result = conn => {
                // Client hung up or sent garbage; only this connection is affected
                if let Err(err) = result {
                    logger::log_connection_error(&err);
                }
            }
            stall = idle::watch(&activity, limits) => {
                // Idle keep-alive connections are closed quietly
                if stall == Stall::Write {
                    logger::log_warning(&format!(
                        "Closing connection from {peer_addr}: client stopped reading for {}s",
                        limits.write.map_or(0, |d| d.as_secs())
                    ));
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
