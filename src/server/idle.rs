// Idle and stalled-write detection for a single connection
//
// The stream records when bytes last moved and when a write started waiting
// on the peer. A watchdog compares those marks against the limits, so a
// transfer that keeps making progress is never cut off however long it runs.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

/// Longest the watchdog sleeps before looking again
const RECHECK: Duration = Duration::from_millis(500);

const NOT_BLOCKED: u64 = u64::MAX;

/// Why the watchdog gave up on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// Peer stopped accepting response bytes for `write_timeout`
    Write,
    /// Nothing moved for `keep_alive_timeout`
    Idle,
}

/// Limits checked by [`watch`]; `None` disables a check
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleLimits {
    pub write: Option<Duration>,
    pub idle: Option<Duration>,
}

impl IdleLimits {
    /// Seconds from config, 0 meaning disabled
    pub fn from_secs(write_timeout: u64, keep_alive_timeout: u64) -> Self {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        Self {
            write: secs(write_timeout),
            idle: secs(keep_alive_timeout),
        }
    }
}

/// Progress marks shared between a [`TrackedStream`] and its watchdog
#[derive(Debug)]
pub struct Activity {
    start: Instant,
    /// Milliseconds since `start` of the last successful read or write
    last_progress: AtomicU64,
    /// Milliseconds since `start` when the pending write began waiting
    blocked_since: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_progress: AtomicU64::new(0),
            blocked_since: AtomicU64::new(NOT_BLOCKED),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(NOT_BLOCKED - 1)
    }

    fn read_progress(&self) {
        self.last_progress.store(self.now_ms(), Ordering::Relaxed);
    }

    fn write_progress(&self) {
        self.last_progress.store(self.now_ms(), Ordering::Relaxed);
        self.blocked_since.store(NOT_BLOCKED, Ordering::Relaxed);
    }

    fn write_flushed(&self) {
        self.blocked_since.store(NOT_BLOCKED, Ordering::Relaxed);
    }

    fn write_blocked(&self) {
        // Keep the earliest mark while the same write stays pending
        let _ = self.blocked_since.compare_exchange(
            NOT_BLOCKED,
            self.now_ms(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    /// `Err` once a limit is exceeded, otherwise how long to wait before
    /// checking again
    fn check(&self, limits: IdleLimits) -> Result<Duration, Stall> {
        let blocked = self.blocked_since.load(Ordering::Relaxed);
        let (since, limit, stall) = if blocked == NOT_BLOCKED {
            let last = self.last_progress.load(Ordering::Relaxed);
            (last, limits.idle, Stall::Idle)
        } else {
            (blocked, limits.write, Stall::Write)
        };

        let Some(limit) = limit else {
            return Ok(RECHECK);
        };
        let elapsed = Duration::from_millis(self.now_ms().saturating_sub(since));
        match limit.checked_sub(elapsed) {
            Some(left) if !left.is_zero() => Ok(left.min(RECHECK)),
            _ => Err(stall),
        }
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the connection behind `activity` has stalled
pub async fn watch(activity: &Activity, limits: IdleLimits) -> Stall {
    loop {
        match activity.check(limits) {
            Ok(wait) => tokio::time::sleep(wait).await,
            Err(stall) => return stall,
        }
    }
}

/// Stream wrapper that reports progress to an [`Activity`]
pub struct TrackedStream<S> {
    inner: S,
    activity: Arc<Activity>,
}

impl<S> TrackedStream<S> {
    pub const fn new(inner: S, activity: Arc<Activity>) -> Self {
        Self { inner, activity }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            self.activity.read_progress();
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        self.record_write(&poll);
        poll
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        self.record_write(&poll);
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let poll = Pin::new(&mut self.inner).poll_flush(cx);
        match poll {
            Poll::Ready(Ok(())) => self.activity.write_flushed(),
            Poll::Pending => self.activity.write_blocked(),
            Poll::Ready(Err(_)) => {}
        }
        poll
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl<S> TrackedStream<S> {
    fn record_write(&self, poll: &Poll<io::Result<usize>>) {
        match poll {
            Poll::Ready(Ok(n)) if *n > 0 => self.activity.write_progress(),
            Poll::Pending => self.activity.write_blocked(),
            _ => {}
        }
    }
}
