//! Per-client fixed window rate limiting.
//!
//! Each client gets `max` requests per window, counted from its first request.
//! Rejected requests still count toward the window. State lives in memory and
//! is shared by every handler the middleware wraps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::RETRY_AFTER;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::warn;

use super::ClientIp;

/// Body of the rejection response.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP";

/// Expired windows are swept once the table reaches this size.
const PRUNE_THRESHOLD: usize = 1024;

static LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// In-memory fixed window limiter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    trust_proxy_headers: bool,
    clients: Mutex<HashMap<ClientIp, Window>>,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Seconds until the window resets, rounded up.
    #[must_use]
    pub fn reset_after_secs(&self) -> u64 {
        self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0)
    }

    fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + self.reset_after_secs();

        headers.insert(LIMIT_HEADER.clone(), HeaderValue::from(self.limit));
        headers.insert(REMAINING_HEADER.clone(), HeaderValue::from(self.remaining));
        headers.insert(RESET_HEADER.clone(), HeaderValue::from(reset_at));
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(max: u32, window: Duration, trust_proxy_headers: bool) -> Self {
        Self {
            max,
            window,
            trust_proxy_headers,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `client` now.
    pub fn check(&self, client: ClientIp) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: ClientIp, now: Instant) -> RateLimitDecision {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        }

        let window = clients.entry(client).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.saturating_duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);

        RateLimitDecision {
            allowed: window.hits <= self.max,
            limit: self.max,
            remaining: self.max.saturating_sub(window.hits),
            reset_after: self
                .window
                .saturating_sub(now.saturating_duration_since(window.started)),
        }
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Reject requests beyond the client's budget with `429`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = ClientIp::from_request(&request, limiter.trust_proxy_headers);
    let decision = limiter.check(client);

    if !decision.allowed {
        metrics::counter!("contact_rate_limited_total").increment(1);
        warn!(client = %client, "Rate limit exceeded");

        let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response();
        decision.apply_headers(response.headers_mut());
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(decision.reset_after_secs()));
        return response;
    }

    let mut response = next.run(request).await;
    decision.apply_headers(response.headers_mut());
    response
}
