//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;
use telemetry_core::constants::APP_VERSION;
use telemetry_core::SourceState;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    source: &'static str,
    source_state: SourceState,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: APP_VERSION,
        source: state.config.pipeline.source.kind.as_str(),
        source_state: state.scheduler.get_current_view().state,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
