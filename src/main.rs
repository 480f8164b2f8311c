//! Contact relay: validates contact form submissions and forwards them by email.

use std::net::SocketAddr;
use std::sync::Arc;

use contact_email::EmailService;
use contact_relay::config::Config;
use contact_relay::startup::build_app;
use contact_telemetry::setup_telemetry;
use tokio::signal;
use tracing::info;

/// Build version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::init()?;
    setup_telemetry(&config.telemetry());

    info!(
        version = VERSION,
        recipient = %config.recipient(),
        pid = std::process::id(),
        "Starting contact-relay"
    );

    let mailer = Arc::new(EmailService::new(config.email_config()?)?);
    let app = build_app(&config, mailer)?;

    #[cfg(feature = "prometheus")]
    let app = app.merge(contact_relay::routes::metrics_routes(
        contact_telemetry::init_metrics(),
    ));

    let addr = config.listen_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(mode = config.mode(), port = config.port, "Server running");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
