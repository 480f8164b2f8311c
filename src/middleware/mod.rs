//! Tower and axum middleware for the relay endpoints.
//!
//! # Middleware Order
//! Middleware is applied in layers. When using `.layer()` on a router:
//! - Outermost layer is added last
//! - Request flows: outermost → innermost → handler
//! - Response flows: handler → innermost → outermost
//!
//! Global stack (outermost first):
//! 1. TraceLayer - Request span
//! 2. RequestIdLayer - Extract/generate request ID, record it on the span
//! 3. MetricsLayer - Request count and latency
//! 4. CorsLayer - Preflight and CORS response headers
//!
//! `/` and `/health` additionally carry a 30 s `TimeoutLayer`; `/send-email`
//! is bounded by the SMTP transport timeout instead.
//!
//! Route stack on `/send-email` (outermost first):
//! 1. `reject_foreign_origin` - 403 for origins outside the allow-list
//! 2. `rate_limit` - Per-client fixed window limiter

pub mod client_ip;
pub mod metrics;
pub mod origin;
pub mod rate_limit;
pub mod request_id;

pub use client_ip::ClientIp;
pub use metrics::MetricsLayer;
pub use origin::{AllowedOrigins, build_cors, reject_foreign_origin};
pub use rate_limit::{RateLimitDecision, RateLimiter, rate_limit};
pub use request_id::{RequestId, RequestIdLayer};
