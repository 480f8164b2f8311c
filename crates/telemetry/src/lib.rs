//! Telemetry setup for structured logging and Prometheus metrics.
//!
//! - **Logging**: `tracing` subscriber with env filter, JSON or compact output
//! - **Metrics**: Prometheus recorder for the `/metrics` endpoint
//!
//! # Features
//! - `prometheus` (default): Prometheus metrics exporter

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "prometheus")]
pub use metrics_exporter_prometheus::PrometheusHandle;

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: String,
    /// Use JSON log format
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_logs: false,
        }
    }
}

/// Initialize Prometheus metrics exporter and return the handle for the /metrics endpoint.
///
/// # Panics
/// Panics if the Prometheus recorder fails to install.
#[cfg(feature = "prometheus")]
#[must_use]
pub fn init_metrics() -> PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Parse a log level name, falling back to INFO.
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn parse_level(level: &str) -> Level {
    match level.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Setup the logging stack: env filter plus JSON or human-readable console output.
///
/// `RUST_LOG` directives are honoured on top of the configured level.
///
/// # Panics
/// Panics if a global subscriber is already installed.
pub fn setup_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(parse_level(&config.log_level).into())
        .add_directive("tower=info".parse().expect("valid directive"))
        .add_directive("hyper=info".parse().expect("valid directive"))
        .add_directive("lettre=info".parse().expect("valid directive"));

    let fmt_layer = if config.json_logs {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
            .compact()
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
