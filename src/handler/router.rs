//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method gate, SPA rewrite,
//! dispatch to the file responder, then CORS and access logging on the way out.

use crate::config::AppState;
use crate::handler::static_files::FileResponder;
use crate::http::{self, cache::CachePolicy, cors};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, RouteDecision};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed by the file responder
pub struct RequestContext<'a> {
    /// Decoded path to serve, after any SPA rewrite
    pub path: &'a str,
    /// Path exactly as received, used for redirects and logging
    pub raw_path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
    pub cache: CachePolicy,
}

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, including errors, is an HTTP response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    // Only the head is needed; nothing is read from the body
    let (parts, _body) = req.into_parts();
    let mut response = route_request(&parts, &state).await;

    cors::apply(&mut response, state.config.http.cors);
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.access_log_enabled() {
        log_access(&parts, &response, remote_addr, started, &state);
    }

    Ok(response)
}

/// Produce the response for `req`, before CORS and server headers
async fn route_request(req: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    let method = &req.method;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method) {
        return resp;
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(req, state.config.http.max_body_size) {
        return resp;
    }

    // 3. Decode the path; query and fragment are already split off by the URI
    let raw_path = req.uri.path();
    let Ok(decoded) = urlencoding::decode(raw_path) else {
        logger::log_warning(&format!("Request path is not valid UTF-8: {raw_path}"));
        return http::build_404_response();
    };

    // 4. SPA rewrite, GET only
    let site = &state.config.site;
    let spa_fallback = site.spa_fallback && *method == Method::GET;
    let decision = routing::decide(&decoded, spa_fallback);
    let path = routing::effective_path(&decoded, spa_fallback, &site.fallback_document);

    // The app shell must be revalidated so new deployments are picked up
    let cache = match decision {
        RouteDecision::Fallback => CachePolicy::NoCache,
        RouteDecision::PassThrough if spa_fallback => CachePolicy::NoCache,
        _ => CachePolicy::default(),
    };

    let ctx = RequestContext {
        path: &path,
        raw_path,
        query: req.uri.query(),
        is_head: *method == Method::HEAD,
        if_none_match: header_string(req, "if-none-match"),
        if_modified_since: header_string(req, "if-modified-since"),
        range_header: header_string(req, "range"),
        cache,
    };

    let responder = FileResponder {
        root: &state.serve_root,
        index_files: &state.config.routes.index_files,
        directory_listing: state.config.http.directory_listing,
    };
    responder.respond(&ctx).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(req: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(req: &Parts, name: &str) -> Option<String> {
    req.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Write one access log line for a finished exchange
fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_label(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.access_log_format);
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::CorsMode;
    use http_body_util::BodyExt;
    use std::fs;

    struct Site {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn site(spa: bool, cors: CorsMode) -> Site {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<div id=app></div>").unwrap();
        fs::write(dir.path().join("logo.png"), b"PNGDATA").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("a b.txt"), "spaced").unwrap();

        let missing = dir.path().join("no-config");
        let mut config = Config::load_from(missing.to_str().unwrap(), Vec::new()).unwrap();
        config.site.root = dir.path().to_path_buf();
        config.site.spa_fallback = spa;
        config.http.cors = cors;
        config.logging.access_log = false;

        let state = Arc::new(AppState::new(config).unwrap());
        Site { _dir: dir, state }
    }

    async fn send(site: &Site, method: Method, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        handle_request(req, Arc::clone(&site.state), addr).await.unwrap()
    }

    async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_spa_route_serves_fallback() {
        let site = site(true, CorsMode::Off);
        let resp = send(&site, Method::GET, "/about").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Cache-Control"], "no-cache");
        assert_eq!(body(resp).await, Bytes::from_static(b"<div id=app></div>"));
    }

    #[tokio::test]
    async fn test_spa_asset_served_verbatim() {
        let site = site(true, CorsMode::Off);
        let resp = send(&site, Method::GET, "/logo.png?v=3").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/png");
        assert_eq!(body(resp).await, Bytes::from_static(b"PNGDATA"));
    }

    #[tokio::test]
    async fn test_spa_missing_asset_404_with_cors() {
        let site = site(true, CorsMode::Origin);
        let resp = send(&site, Method::GET, "/missing.png").await;
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_non_spa_root_serves_index() {
        let site = site(false, CorsMode::Off);
        let resp = send(&site, Method::GET, "/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body(resp).await, Bytes::from_static(b"<div id=app></div>"));
    }

    #[tokio::test]
    async fn test_non_spa_route_is_404() {
        let site = site(false, CorsMode::Off);
        let resp = send(&site, Method::GET, "/about").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_cors_on_every_status() {
        let site = site(false, CorsMode::Full);
        for (method, uri) in [
            (Method::GET, "/anything"),
            (Method::GET, "/logo.png"),
            (Method::GET, "/docs"),
            (Method::POST, "/anything"),
            (Method::OPTIONS, "/anything"),
        ] {
            let resp = send(&site, method.clone(), uri).await;
            assert_eq!(
                resp.headers()["Access-Control-Allow-Origin"],
                "*",
                "{method} {uri} -> {}",
                resp.status()
            );
            assert!(resp.headers().contains_key("Access-Control-Allow-Methods"));
            assert!(resp.headers().contains_key("Access-Control-Allow-Headers"));
        }
    }

    #[tokio::test]
    async fn test_no_cors_headers_when_disabled() {
        let site = site(true, CorsMode::Off);
        for uri in ["/", "/about", "/missing.png"] {
            let resp = send(&site, Method::GET, uri).await;
            assert!(!resp
                .headers()
                .keys()
                .any(|k| k.as_str().starts_with("access-control-")));
        }
    }

    #[tokio::test]
    async fn test_head_is_not_rewritten() {
        let site = site(true, CorsMode::Off);
        let resp = send(&site, Method::HEAD, "/about").await;
        assert_eq!(resp.status(), 404);

        let resp = send(&site, Method::HEAD, "/logo.png").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "7");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_method_gate() {
        let site = site(false, CorsMode::Off);
        assert_eq!(send(&site, Method::OPTIONS, "/").await.status(), 204);
        assert_eq!(send(&site, Method::DELETE, "/").await.status(), 405);
    }

    #[tokio::test]
    async fn test_percent_decoded_path() {
        let site = site(false, CorsMode::Off);
        let resp = send(&site, Method::GET, "/docs/a%20b.txt").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body(resp).await, Bytes::from_static(b"spaced"));
    }

    #[tokio::test]
    async fn test_encoded_traversal_blocked() {
        let site = site(false, CorsMode::Off);
        let resp = send(&site, Method::GET, "/%2e%2e/%2e%2e/etc/passwd").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_directory_redirect_stays_on_site() {
        let site = site(false, CorsMode::Off);
        fs::create_dir(site.state.serve_root.join("evil.example")).unwrap();

        let resp = send(&site, Method::GET, "//docs").await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/docs/");

        let resp = send(&site, Method::GET, "//evil.example").await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/evil.example/");
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let site = site(false, CorsMode::Origin);
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header("content-length", "999999999")
            .body(())
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), addr).await.unwrap();
        assert_eq!(resp.status(), 413);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_server_header() {
        let site = site(false, CorsMode::Off);
        let resp = send(&site, Method::GET, "/").await;
        assert!(resp.headers()[SERVER].to_str().unwrap().starts_with("spa-serve/"));
    }
}
