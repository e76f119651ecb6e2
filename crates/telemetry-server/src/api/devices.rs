use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use telemetry_core::{Device, HeartbeatRequest, StatsResponse, UploadRequest};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Decode a JSON body without looking at Content-Type. Any decode failure,
/// including a missing field, is a 400.
fn decode<T: DeserializeOwned>(id: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(device_id = %id, error = %e, "Rejected request body");
        ApiError::BadRequest(e.to_string())
    })
}

async fn lookup(state: &AppState, id: &str) -> Result<Arc<Device>, ApiError> {
    state.registry().lookup(id).await.map_err(|e| {
        debug!(device_id = %id, "Unknown device");
        ApiError::from(e)
    })
}

/// POST /devices/:id/heartbeat
///
/// The body is decoded before the lookup, so a malformed body is a 400 even
/// for an unknown device.
pub async fn record_heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let req: HeartbeatRequest = decode(&id, &body)?;
    let device = lookup(&state, &id).await?;

    device.record_heartbeat(req.sent_at).await;
    debug!(device_id = %id, sent_at = %req.sent_at, "Heartbeat recorded");

    Ok(StatusCode::CREATED)
}

/// POST /devices/:id/stats
pub async fn record_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let req: UploadRequest = decode(&id, &body)?;
    let device = lookup(&state, &id).await?;

    device.record_upload(req.upload_time).await;
    debug!(device_id = %id, upload_time = req.upload_time, "Upload sample recorded");

    Ok(StatusCode::CREATED)
}

/// GET /devices/:id/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let device = lookup(&state, &id).await?;
    let stats = device.stats().await;
    Ok(Json(StatsResponse::from(stats)))
}
