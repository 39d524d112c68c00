//! Dashboard view handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telemetry_core::{CanonicalRecord, CurrentView, SourceState, Streams};

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Only the most recent `limit` records
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ViewResponse {
    pub state: SourceState,
    pub stale: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub total: usize,
    pub records: Vec<CanonicalRecord>,
}

#[derive(Serialize)]
pub struct StreamsResponse {
    pub state: SourceState,
    pub stale: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub streams: Streams,
}

fn tail(records: &[CanonicalRecord], limit: Option<usize>) -> Vec<CanonicalRecord> {
    let start = limit.map(|n| records.len().saturating_sub(n)).unwrap_or(0);
    records[start..].to_vec()
}

/// GET /api/v1/view
pub async fn current(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Json<ViewResponse> {
    let CurrentView { records, state: source_state, last_success, stale } =
        state.scheduler.get_current_view();

    Json(ViewResponse {
        state: source_state,
        stale,
        last_success,
        total: records.len(),
        records: tail(&records, query.limit),
    })
}

/// GET /api/v1/view/streams
pub async fn streams(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Json<StreamsResponse> {
    let (view, streams) = state.scheduler.get_current_streams();

    let streams = Streams {
        system_stats: tail(&streams.system_stats, query.limit),
        detection: tail(&streams.detection, query.limit),
        unknown: tail(&streams.unknown, query.limit),
    };

    Json(StreamsResponse {
        state: view.state,
        stale: view.stale,
        last_success: view.last_success,
        streams,
    })
}
