//! Telemetry Feed Server
//!
//! Hosts the poll scheduler and serves its committed view to dashboards.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   TELEMETRY SERVER                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐        ┌────────────────────────────────┐ │
//! │  │  API      │  read  │  PollScheduler (background)    │ │
//! │  │  (Axum)   │◄───────┤  adapter → normalize → window  │ │
//! │  │           │ refresh│  → fallback → PollState        │ │
//! │  └─────┬─────┘───────►└───────────────┬────────────────┘ │
//! │        │ push / upload                ▼                  │
//! │        └──────────────────────►  Source adapter          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use telemetry_core::{PollScheduler, Sources};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scheduler: PollScheduler,
    pub sources: Sources,
    pub config: config::Config,
}

impl AppState {
    /// Wire a scheduler to the configured source
    pub fn new(config: config::Config, sources: Sources) -> Self {
        let scheduler = PollScheduler::new(sources.adapter.clone(), config.pipeline.clone());
        Self { scheduler, sources, config }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Read side
    let view_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/view", get(handlers::view::current))
        .route("/api/v1/view/streams", get(handlers::view::streams))
        .route("/api/v1/status", get(handlers::status::status))
        .route("/api/v1/summary", get(handlers::report::summary))
        .route("/api/v1/report.csv", get(handlers::report::download));

    // Write side
    let ingest_routes = Router::new()
        .route("/api/v1/refresh", post(handlers::status::refresh))
        .route("/api/v1/push", post(handlers::ingest::push))
        .route("/api/v1/upload", post(handlers::ingest::upload));

    // Combine all routes
    Router::new()
        .merge(view_routes)
        .merge(ingest_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
