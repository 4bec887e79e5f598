//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin policy, preflight)
//!     → rate_limit.rs (per-IP fixed window, registration submissions only)
//!     → Pass to handler
//! Outgoing response:
//!     → headers.rs (hardening headers)
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before any parsing of the body
//! - Rate-limit state is an owned instance in `AppState`, not a global
//! - No trust in client input; forwarded headers are opt-in

pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Clock, FixedWindowLimiter, ManualClock, RateLimitDecision, SystemClock, RATE_LIMIT_WINDOW};
