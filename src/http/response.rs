//! HTTP response building module
//!
//! Builders for every status the file responder can produce. Build failures
//! are logged and replaced by an empty response rather than panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::cache::CachePolicy;
use super::range::ByteRange;

/// Methods the server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Representation metadata shared by 200, 206 and 304 responses
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: &'static str,
    pub etag: String,
    pub last_modified: Option<String>,
    pub cache: CachePolicy,
}

/// Build 304 Not Modified response
pub fn build_304_response(file: &FileHeaders) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(304)
        .header("ETag", &file.etag)
        .header("Cache-Control", file.cache.to_header_value());
    if let Some(modified) = &file.last_modified {
        builder = builder.header("Last-Modified", modified);
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 301 redirect, used to add the trailing slash to directory paths
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(301)
        .header("Location", location)
        .header("Content-Type", "text/plain")
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_error(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut resp = build_plain_error(405, "405 Method Not Allowed");
    resp.headers_mut().insert(
        "Allow",
        hyper::header::HeaderValue::from_static(ALLOWED_METHODS),
    );
    resp
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_plain_error(413, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    let mut resp = build_plain_error(416, "416 Range Not Satisfiable");
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        resp.headers_mut().insert("Content-Range", value);
    }
    resp
}

/// Build OPTIONS response; CORS headers are added by the caller
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generated HTML response (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response for a whole file
pub fn build_file_response(
    data: Bytes,
    file: &FileHeaders,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", file.content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", &file.etag)
        .header("Cache-Control", file.cache.to_header_value());
    if let Some(modified) = &file.last_modified {
        builder = builder.header("Last-Modified", modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 206 Partial Content response; `data` is the already-sliced range
pub fn build_partial_response(
    data: Bytes,
    file: &FileHeaders,
    range: ByteRange,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(206)
        .header("Content-Type", file.content_type)
        .header("Content-Length", range.len())
        .header("Content-Range", range.content_range(total_size))
        .header("Accept-Ranges", "bytes")
        .header("ETag", &file.etag)
        .header("Cache-Control", file.cache.to_header_value());
    if let Some(modified) = &file.last_modified {
        builder = builder.header("Last-Modified", modified);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn build_plain_error(status: u16, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .body(Full::new(Bytes::from_static(message.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(message, &e);
            Response::new(Full::new(Bytes::from_static(message.as_bytes())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn file_headers() -> FileHeaders {
        FileHeaders {
            content_type: "text/plain; charset=utf-8",
            etag: "\"abc\"".to_string(),
            last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            cache: CachePolicy::default(),
        }
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_file_response_head_keeps_length() {
        let resp = build_file_response(Bytes::from_static(b"hello"), &file_headers(), true);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "5");
        assert_eq!(resp.headers()["Last-Modified"], "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_partial_response() {
        let range = ByteRange { start: 1, end: 3 };
        let data = Bytes::from_static(b"ell");
        let resp = build_partial_response(data, &file_headers(), range, 5, false);
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 1-3/5");
        assert_eq!(resp.headers()["Content-Length"], "3");
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"ell"));
    }

    #[test]
    fn test_error_responses() {
        assert_eq!(build_404_response().status(), 404);
        let resp = build_405_response();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["Allow"], ALLOWED_METHODS);
        let resp = build_416_response(42);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["Content-Range"], "bytes */42");
    }

    #[test]
    fn test_redirect_and_options() {
        let resp = build_redirect_response("/docs/");
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/docs/");

        let resp = build_options_response();
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["Allow"], ALLOWED_METHODS);
    }
}
