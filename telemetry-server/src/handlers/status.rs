//! Poll loop status + manual refresh

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use telemetry_core::logic::window;
use telemetry_core::{EventType, PollStats, SourceKind, SourceState, TickOutcome, Trigger};

use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub source: SourceKind,
    pub state: SourceState,
    pub stale: bool,
    pub records: usize,
    pub counts: BTreeMap<EventType, usize>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub poll_interval_secs: u64,
    pub stats: PollStats,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub outcome: TickOutcome,
    pub records: usize,
}

/// GET /api/v1/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.scheduler.snapshot();
    let counts = window::split_by_type(&snapshot.output.records).counts();

    Json(StatusResponse {
        source: state.config.pipeline.source.kind,
        state: snapshot.output.state,
        stale: snapshot.output.stale,
        records: snapshot.output.records.len(),
        counts,
        last_attempt: snapshot.last_attempt,
        last_success: snapshot.last_success,
        poll_interval_secs: state.config.pipeline.poll_interval.as_secs(),
        stats: snapshot.stats,
    })
}

/// POST /api/v1/refresh
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let outcome = state.scheduler.tick(Trigger::Manual).await;
    tracing::debug!("Manual refresh: {:?}", outcome);

    Json(RefreshResponse {
        outcome,
        records: state.scheduler.get_current_view().records.len(),
    })
}
