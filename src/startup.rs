//! Server startup and wiring.

use std::sync::Arc;

use axum::Router;
use contact_email::MailTransport;
use http::Request;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::config::{Config, ConfigError};
use crate::middleware::{AllowedOrigins, MetricsLayer, RateLimiter, RequestIdLayer, build_cors};
use crate::routes::rest_routes;
use crate::services::ContactService;

/// Build the application router around the given mail transport.
///
/// # Errors
/// Returns `ConfigError` if the CORS origin list cannot be parsed.
pub fn build_app(config: &Config, mailer: Arc<dyn MailTransport>) -> Result<Router, ConfigError> {
    let origins = AllowedOrigins::new(config.allowed_origins()?);
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window(),
        config.trust_proxy_headers,
    ));
    let contact = ContactService::new(mailer, config.recipient(), config.is_development());

    let cors = build_cors(&origins);
    let router = rest_routes(contact, origins, limiter);

    // Executes top-to-bottom on request
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = tracing::field::Empty,
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(RequestIdLayer::new())
        .layer(MetricsLayer::new())
        .layer(cors);

    Ok(router.layer(middleware))
}
