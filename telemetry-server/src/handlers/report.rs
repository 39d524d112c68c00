//! Report download + KPI summary

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telemetry_core::logic::{report, window};
use telemetry_core::{EventType, SourceState, StreamSummary};

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Export a single stream
    pub event_type: Option<EventType>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub state: SourceState,
    pub stale: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub summary: StreamSummary,
}

/// GET /api/v1/report.csv
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let view = state.scheduler.get_current_view();
    let body = report::to_csv(&view.records, query.event_type)
        .map_err(|e| AppError::InternalError(format!("report: {}", e)))?;

    tracing::info!("Report download: {} records, {} bytes", view.records.len(), body.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"full_report.csv\""),
        ],
        body,
    ))
}

/// GET /api/v1/summary
pub async fn summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let view = state.scheduler.get_current_view();
    let summary = window::split_by_type(&view.records).summary();

    Json(SummaryResponse {
        state: view.state,
        stale: view.stale,
        last_success: view.last_success,
        summary,
    })
}
