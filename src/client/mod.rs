//! HTTP client functionality

pub mod http;

// Re-exports
pub use http::{HttpClient, ACCEPT_BINARY, ACCEPT_RELEASE_JSON, MAX_REDIRECTS};
