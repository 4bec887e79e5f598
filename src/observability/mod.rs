//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, limiter, sheets client produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (JSON in production)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every HTTP span
//! - Phone numbers are never logged

pub mod logging;
pub mod metrics;
