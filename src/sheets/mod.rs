//! Google Sheets integration.
//!
//! # Data Flow
//! ```text
//! Configuration (sheet id, tab name, service account)
//!     → auth.rs (JWT assertion → bearer token, cached)
//!     → client.rs (append / header setup / connection test)
//!     → types.rs (results, typed errors)
//! ```
//!
//! Handlers depend on the [`SheetWriter`] trait only, so tests can swap in an
//! in-memory writer.

pub mod auth;
pub mod client;
pub mod types;

pub use client::GoogleSheetsClient;
pub use types::{HeaderSetup, SheetAppendResult, SheetError, SheetInfo, SheetWriter, HEADER_ROW, PAYMENT_PENDING};
