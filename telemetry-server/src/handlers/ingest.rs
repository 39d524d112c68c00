//! Push-receive and upload handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use telemetry_core::{PushReceipt, TickOutcome, Trigger, UploadSummary};

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    /// `data:<mime>;base64,<payload>` or bare base64
    pub contents: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub summary: UploadSummary,
    pub refresh: TickOutcome,
}

/// POST /api/v1/push
pub async fn push(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<PushReceipt>)> {
    let buffer = state
        .sources
        .push
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Push source is not enabled".to_string()))?;

    let receipt = buffer.push(payload)?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

/// POST /api/v1/upload
pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> AppResult<Json<UploadResponse>> {
    let upload = state
        .sources
        .upload
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Upload source is not enabled".to_string()))?;

    let summary = match upload.ingest_encoded(&req.filename, &req.contents) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Upload {} rejected: {}", req.filename, e);
            return Err(e.into());
        }
    };

    let refresh = state.scheduler.tick(Trigger::Manual).await;
    Ok(Json(UploadResponse { summary, refresh }))
}
