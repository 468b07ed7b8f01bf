//! HTTP protocol layer module
//!
//! Protocol building blocks for the file responder, decoupled from routing:
//! MIME typing, conditional requests, byte ranges, CORS and response builders.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use cors::CorsMode;
pub use range::parse_range_header;
pub use response::{
    build_404_response, build_405_response, build_413_response, build_416_response,
    build_options_response, build_redirect_response,
};
