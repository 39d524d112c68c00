//! Telemetry Feed Server - entry point

use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telemetry_server::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "telemetry_server=debug,telemetry_core=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("invalid configuration")?;

    tracing::info!("Telemetry Server starting ({})...", config.environment);
    tracing::info!(
        "Source: {} {}",
        config.pipeline.source.kind,
        config.pipeline.source.address.as_deref().unwrap_or("")
    );

    // Build source + scheduler
    let sources = telemetry_core::logic::source::build(&config.pipeline)
        .context("failed to build source adapter")?;
    let state = AppState::new(config.clone(), sources);
    let poller = state.scheduler.spawn();

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    poller.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
