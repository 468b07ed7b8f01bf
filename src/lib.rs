//! `spa-serve`: a static file server with single-page-application fallback
//! and optional permissive CORS.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the server can be embedded and driven from integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
