//! Request routing module
//!
//! Path decisions made before the file responder runs.

pub mod rewrite;

pub use rewrite::{decide, effective_path, RouteDecision};
