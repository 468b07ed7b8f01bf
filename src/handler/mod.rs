//! Request handler module
//!
//! Request dispatch plus the directory-rooted file responder behind it.

pub mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
