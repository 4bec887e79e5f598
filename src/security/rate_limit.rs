//! Fixed-window rate limiting keyed by client address.
//!
//! Each client gets a counter that starts with its first request and resets
//! once the window has elapsed. Bursts of up to twice the limit are possible
//! across a window boundary; that is accepted behaviour.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Length of a rate-limit window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Time source for the limiter.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    request_count: u32,
    window_start: Instant,
}

impl RateLimitEntry {
    fn new(now: Instant) -> Self {
        Self {
            request_count: 1,
            window_start: now,
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Per-client fixed-window counter.
pub struct FixedWindowLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window,
            clock,
        }
    }

    /// Count a request from `key` and decide whether it may proceed.
    ///
    /// The sweep, lookup and update happen under one lock. A rejected
    /// request leaves its entry untouched.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let window = self.window;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        // O(n) per request; fine for a single small form endpoint.
        entries.retain(|_, entry| now.saturating_duration_since(entry.window_start) <= window);

        if let Some(entry) = entries.get_mut(key) {
            let elapsed = now.saturating_duration_since(entry.window_start);
            if elapsed >= window {
                *entry = RateLimitEntry::new(now);
            } else if entry.request_count < self.max_requests {
                entry.request_count += 1;
            } else {
                return RateLimitDecision::Limited {
                    retry_after_secs: ceil_secs(window - elapsed),
                };
            }
            return RateLimitDecision::Allowed {
                remaining: self.max_requests.saturating_sub(entry.request_count),
            };
        }

        entries.insert(key.to_string(), RateLimitEntry::new(now));
        RateLimitDecision::Allowed {
            remaining: self.max_requests.saturating_sub(1),
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Identify the client: the peer IP, or the first `X-Forwarded-For` hop when
/// the proxy in front is trusted.
pub fn client_key(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware guarding registration submissions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let settings = &state.config.rate_limit;
    if !settings.enabled {
        return next.run(request).await;
    }

    let key = client_key(&request, settings.trust_forwarded_for);
    match state.limiter.check(&key) {
        RateLimitDecision::Allowed { remaining } => {
            tracing::debug!(client = %key, remaining, "Rate limit check passed");
            next.run(request).await
        }
        RateLimitDecision::Limited { retry_after_secs } => {
            tracing::warn!(client = %key, retry_after_secs, "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited { retry_after_secs }.into_response()
        }
    }
}
