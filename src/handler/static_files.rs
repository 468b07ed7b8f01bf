//! Static file serving module
//!
//! The file responder: maps a decoded request path onto the serve root,
//! enforces containment, resolves index documents and directory listings,
//! and answers conditional and range requests.

use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult, response::FileHeaders};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory-rooted responder settings, borrowed from the application state
pub struct FileResponder<'a> {
    /// Canonical serve root
    pub root: &'a Path,
    pub index_files: &'a [String],
    pub directory_listing: bool,
}

impl FileResponder<'_> {
    /// Serve `ctx.path` from the root
    pub async fn respond(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        let Some(relative) = relative_path(ctx.path) else {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.raw_path));
            return http::build_404_response();
        };

        let Some(target) = self.resolve(&relative, ctx.path).await else {
            return http::build_404_response();
        };

        let Ok(metadata) = fs::metadata(&target).await else {
            return http::build_404_response();
        };

        if !metadata.is_dir() {
            return serve_file(ctx, &target).await;
        }

        // Directories are only served under their slash-terminated URL
        if !ctx.raw_path.ends_with('/') {
            return http::build_redirect_response(&directory_location(ctx.raw_path, ctx.query));
        }

        if let Some(index) = self.find_index(&target).await {
            return serve_file(ctx, &index).await;
        }

        if self.directory_listing {
            return match listing::render(&target, ctx.path).await {
                Ok(html) => http::response::build_html_response(html, ctx.is_head),
                Err(e) => {
                    logger::log_error(&format!(
                        "Failed to list directory '{}': {e}",
                        target.display()
                    ));
                    http::build_404_response()
                }
            };
        }

        http::build_404_response()
    }

    /// Join and canonicalize, refusing anything that escapes the root
    async fn resolve(&self, relative: &Path, request_path: &str) -> Option<PathBuf> {
        // Missing files are common (404), no need to log
        let canonical = fs::canonicalize(self.root.join(relative)).await.ok()?;
        if canonical.starts_with(self.root) {
            Some(canonical)
        } else {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {request_path} -> {}",
                canonical.display()
            ));
            None
        }
    }

    /// First configured index document present in `dir`
    async fn find_index(&self, dir: &Path) -> Option<PathBuf> {
        for name in self.index_files {
            let candidate = dir.join(name);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                return Some(candidate);
            }
        }
        None
    }
}

/// `Location` for the slash-terminated form of a directory URL.
///
/// Leading slashes are collapsed so `//host` can never become a
/// protocol-relative redirect to another site.
fn directory_location(raw_path: &str, query: Option<&str>) -> String {
    let path = raw_path.trim_start_matches('/');
    match query {
        Some(q) => format!("/{path}/?{q}"),
        None => format!("/{path}/"),
    }
}

/// Turn a decoded URL path into a path relative to the serve root.
///
/// Empty and `.` segments are dropped. Returns `None` for `..` segments and
/// for characters that could change how the path is interpreted.
pub fn relative_path(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => relative.push(s),
        }
    }
    Some(relative)
}

/// Build the 200/206/304/416 response for a regular file
async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> Response<Full<Bytes>> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            logger::log_error(&format!("Failed to stat file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let modified = metadata.modified().ok();
    let file = FileHeaders {
        content_type: mime::content_type_for(path),
        etag: cache::generate_etag(metadata.len(), modified),
        last_modified: modified.map(cache::format_http_date),
        cache: ctx.cache,
    };

    if is_not_modified(ctx, &file.etag, modified) {
        return http::response::build_304_response(&file);
    }

    let content = match fs::read(path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let total_size = content.len();
    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Partial(range) => {
            let slice = content.slice(range.start..=range.end);
            http::response::build_partial_response(slice, &file, range, total_size, ctx.is_head)
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::Full => http::response::build_file_response(content, &file, ctx.is_head),
    }
}

/// `If-None-Match` wins over `If-Modified-Since` when both are present
fn is_not_modified(
    ctx: &RequestContext<'_>,
    etag: &str,
    modified: Option<std::time::SystemTime>,
) -> bool {
    if ctx.if_none_match.is_some() {
        return cache::check_etag_match(ctx.if_none_match.as_deref(), etag);
    }
    modified.is_some_and(|m| cache::check_not_modified_since(ctx.if_modified_since.as_deref(), m))
}
