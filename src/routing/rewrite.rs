//! SPA fallback path rewriting
//!
//! Decides, per request path, whether the file responder sees the path as
//! requested or the fallback document instead. Requests whose final segment
//! contains a `.` are treated as asset requests; everything else is an
//! application route. A dotted directory such as `/v1.2` is therefore served
//! as an asset, a known limitation of the dot convention.

use std::borrow::Cow;

/// Outcome of the rewrite decision for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve the path exactly as requested
    PassThrough,
    /// Final segment looks like a file name; serve as requested
    Asset,
    /// Application route; serve the fallback document
    Fallback,
}

/// Classify `path` (decoded, without query or fragment)
pub fn decide(path: &str, spa_fallback: bool) -> RouteDecision {
    if !spa_fallback {
        return RouteDecision::PassThrough;
    }

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    if last_segment.contains('.') {
        RouteDecision::Asset
    } else if path == "/" {
        RouteDecision::PassThrough
    } else {
        RouteDecision::Fallback
    }
}

/// Path the file responder should serve for `path`
///
/// ```
/// use spa_serve::routing::rewrite::effective_path;
///
/// assert_eq!(effective_path("/about", true, "index.html"), "/index.html");
/// assert_eq!(effective_path("/logo.png", true, "index.html"), "/logo.png");
/// assert_eq!(effective_path("/about", false, "index.html"), "/about");
/// ```
pub fn effective_path<'a>(
    path: &'a str,
    spa_fallback: bool,
    fallback_document: &str,
) -> Cow<'a, str> {
    match decide(path, spa_fallback) {
        RouteDecision::PassThrough | RouteDecision::Asset => Cow::Borrowed(path),
        RouteDecision::Fallback => Cow::Owned(fallback_path(fallback_document)),
    }
}

/// Absolute request path of the fallback document
pub fn fallback_path(fallback_document: &str) -> String {
    format!("/{}", fallback_document.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "index.html";

    #[test]
    fn test_dotted_segment_passes_through() {
        for path in ["/logo.png", "/assets/app.3f9c.js", "/missing.png", "/.well-known/x.json"] {
            assert_eq!(decide(path, true), RouteDecision::Asset, "{path}");
            assert_eq!(effective_path(path, true, FALLBACK), path);
        }
    }

    #[test]
    fn test_application_routes_fall_back() {
        for path in ["/about", "/users/42", "/about/", "/a/b/c", "/v1.2/"] {
            assert_eq!(decide(path, true), RouteDecision::Fallback, "{path}");
            assert_eq!(effective_path(path, true, FALLBACK), "/index.html");
        }
    }

    #[test]
    fn test_root_is_untouched() {
        assert_eq!(decide("/", true), RouteDecision::PassThrough);
        assert_eq!(effective_path("/", true, FALLBACK), "/");
    }

    #[test]
    fn test_dotted_directory_is_misclassified() {
        // Known ambiguity of the dot convention
        assert_eq!(decide("/v1.2", true), RouteDecision::Asset);
        assert_eq!(effective_path("/v1.2", true, FALLBACK), "/v1.2");
    }

    #[test]
    fn test_disabled_never_rewrites() {
        for path in ["/", "/about", "/logo.png", "/users/42/", ""] {
            assert_eq!(decide(path, false), RouteDecision::PassThrough);
            assert_eq!(effective_path(path, false, FALLBACK), path);
        }
    }

    #[test]
    fn test_custom_fallback_document() {
        assert_eq!(effective_path("/dashboard", true, "app/shell.html"), "/app/shell.html");
        assert_eq!(effective_path("/dashboard", true, "/200.html"), "/200.html");
    }
}
