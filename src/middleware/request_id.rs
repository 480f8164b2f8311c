//! Request ID middleware for log correlation.
//!
//! Propagates a caller-supplied `x-request-id` or generates one, records it on
//! the current span, stores it in request extensions and echoes it back.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderName, HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::Span;
use uuid::Uuid;

/// Header name for request ID propagation.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Maximum accepted length for caller-supplied request IDs.
const MAX_REQUEST_ID_LENGTH: usize = 64;

/// Request ID for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Generate a new random request ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Accept a caller-supplied ID if it is non-empty, short and printable.
    #[must_use]
    pub fn accept(candidate: &str) -> Option<Self> {
        let acceptable = !candidate.is_empty()
            && candidate.len() <= MAX_REQUEST_ID_LENGTH
            && candidate.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(candidate.into()))
    }

    /// Get as string slice.
    #[must_use]
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    fn from_request<T>(req: &Request<T>) -> Self {
        req.headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::accept)
            .unwrap_or_else(Self::generate)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tower layer for request ID propagation.
#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdMiddleware { inner }
    }
}

/// Request ID middleware service.
#[derive(Clone)]
pub struct RequestIdMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = RequestId::from_request(&req);
        Span::current().record("request_id", request_id.as_str());
        req.extensions_mut().insert(request_id.clone());

        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                response
                    .headers_mut()
                    .insert(REQUEST_ID_HEADER.clone(), value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use tower::{ServiceBuilder, ServiceExt, service_fn};

    use super::*;

    async fn echo_extension(req: Request<()>) -> Result<Response<String>, Infallible> {
        let id = req
            .extensions()
            .get::<RequestId>()
            .map(ToString::to_string)
            .unwrap_or_default();
        Ok(Response::new(id))
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    #[test]
    fn rejects_unusable_ids() {
        assert!(RequestId::accept("").is_none());
        assert!(RequestId::accept(&"a".repeat(MAX_REQUEST_ID_LENGTH + 1)).is_none());
        assert!(RequestId::accept("has space").is_none());
        assert_eq!(RequestId::accept("req-42").unwrap().as_str(), "req-42");
    }

    #[tokio::test]
    async fn propagates_supplied_id() {
        let service = ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .service(service_fn(echo_extension));

        let req = Request::builder()
            .header("x-request-id", "req-42")
            .body(())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
        assert_eq!(response.body(), "req-42");
    }

    #[tokio::test]
    async fn generates_missing_id() {
        let service = ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .service(service_fn(echo_extension));

        let response = service
            .oneshot(Request::builder().body(()).unwrap())
            .await
            .unwrap();

        let header = response.headers()["x-request-id"].to_str().unwrap();
        assert_eq!(header.len(), 36);
        assert_eq!(header, response.body());
    }
}
