//! Validators and freshness
//!
//! Weak-cost `ETag`s from file metadata, HTTP dates, and the two conditional
//! request checks. `Cache-Control` values live here too.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// IMF-fixdate layout used by `Last-Modified` and `If-Modified-Since`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Quoted `ETag` built from modification time and size, `"<mtime ns hex>-<len hex>"`.
///
/// Computed from metadata alone so a 304 never requires reading the file.
/// Nanosecond mtime keeps two same-size writes within one second distinct.
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let nanos = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{nanos:x}-{len:x}\"")
}

/// Whether `If-None-Match` names `etag`.
///
/// Accepts a comma-separated list, weak validators (`W/"..."`) and `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let Some(header) = if_none_match else {
        return false;
    };
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// Format a modification time as an HTTP date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Check `If-Modified-Since` against the file's modification time.
///
/// Returns true when the client copy is still fresh (should return 304).
/// Comparison is at second precision since HTTP dates carry no fraction.
/// Unparsable dates are ignored.
pub fn check_not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(header) = if_modified_since else {
        return false;
    };
    let Ok(since) = DateTime::parse_from_rfc2822(header.trim()) else {
        return false;
    };
    let modified = DateTime::<Utc>::from(modified);
    modified.timestamp() <= since.timestamp()
}

/// `Cache-Control` sent with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Cacheable for this many seconds
    Public(u32),
    /// Revalidate every time; the SPA shell changes with each deployment
    NoCache,
}

impl CachePolicy {
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(3600)
    }
}
