//! Home Device Dashboard
//!
//! Serves the device dashboard in front of a smart-home REST backend.

use home_device_dashboard::{api, bus, client, config, refresh, router, services};

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "home_device_dashboard=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Home Device Dashboard v{} ({})",
        env!("HDD_VERSION"),
        env!("HDD_GIT_SHA")
    );

    // Load configuration
    let config = config::load_config()?;
    tracing::info!(
        "Configuration loaded, port: {}, backend: {}",
        config.port,
        config.api_url
    );

    // Create event bus
    let bus = bus::create_bus();
    tracing::info!("Event bus initialized");

    let backend = client::HttpDeviceClient::new(&config.api_url, config.request_timeout())?;
    let service = services::DeviceService::new(Arc::new(backend), bus.clone());

    // Refetch device data after a quiet period
    let auto_refresh = Arc::new(refresh::AutoRefresh::new(
        service.clone(),
        config.refresh_interval(),
    ));
    let refresh_task = auto_refresh.clone().start();

    let state = api::AppState::new(service, auto_refresh.clone(), &config.api_url);
    let app = router::router(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping background tasks...");
    auto_refresh.stop();
    if let Err(e) = refresh_task.await {
        tracing::warn!("Auto refresh task ended abnormally: {}", e);
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
