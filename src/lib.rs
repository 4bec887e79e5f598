//! Event registration backend.
//!
//! Accepts registration form submissions over HTTP, sanitizes and validates
//! them, applies a per-client rate limit and appends each accepted
//! registration as a row in a Google Sheets spreadsheet.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registration;
pub mod security;
pub mod sheets;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
