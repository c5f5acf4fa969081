//! Check-in route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Value, json};
use skycheck_jobs::{CheckInRequest, CheckInService, JobLogs, JobRecord, StatusSummary};
use tracing::info;

use crate::error::ApiError;

/// `GET /api/status` body. `activeCheckIns` mirrors `scheduledCount` for
/// older clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub summary: StatusSummary,
    pub active_check_ins: usize,
}

impl From<StatusSummary> for StatusResponse {
    fn from(summary: StatusSummary) -> Self {
        Self {
            active_check_ins: summary.scheduled_count,
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub check_in: JobRecord,
}

/// GET /api/status
pub async fn status(State(service): State<Arc<CheckInService>>) -> Json<StatusResponse> {
    Json(service.status_summary().into())
}

/// GET /api/checkins
pub async fn list_checkins(State(service): State<Arc<CheckInService>>) -> Json<Vec<JobRecord>> {
    Json(service.list_all())
}

/// POST /api/checkins
pub async fn create_checkin(
    State(service): State<Arc<CheckInService>>,
    body: Result<Json<CheckInRequest>, JsonRejection>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let Json(request) = body?;
    let check_in = service.create(request)?;
    info!(job_id = %check_in.id, "check-in created via API");
    Ok(Json(CheckInResponse { check_in }))
}

/// GET /api/checkins/{id}
pub async fn get_checkin(
    State(service): State<Arc<CheckInService>>,
    Path(id): Path<String>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let check_in = service.get(&id)?;
    Ok(Json(CheckInResponse { check_in }))
}

/// DELETE /api/checkins/{id}
pub async fn cancel_checkin(
    State(service): State<Arc<CheckInService>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    service.cancel(&id)?;
    Ok(Json(json!({ "message": "Check-in cancelled" })))
}

/// GET /api/checkins/{id}/logs
pub async fn checkin_logs(
    State(service): State<Arc<CheckInService>>,
    Path(id): Path<String>,
) -> Result<Json<JobLogs>, ApiError> {
    Ok(Json(service.logs_for(&id)?))
}
