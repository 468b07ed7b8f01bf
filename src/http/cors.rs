//! Cross-origin header injection
//!
//! Applied once to the finished response, so success and error responses
//! alike carry the same headers.

use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::Response;
use serde::Deserialize;

/// How much cross-origin access to advertise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    /// No CORS headers
    #[default]
    Off,
    /// `Access-Control-Allow-Origin: *` only
    Origin,
    /// Origin plus allowed methods and headers
    Full,
}

impl CorsMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Origin => "origin",
            Self::Full => "full",
        }
    }
}

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// Add the CORS headers for `mode` to `response`, replacing any existing ones
pub fn apply<B>(response: &mut Response<B>, mode: CorsMode) {
    if mode == CorsMode::Off {
        return;
    }

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    if mode == CorsMode::Full {
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}
