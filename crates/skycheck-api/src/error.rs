//! API error types.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use skycheck_jobs::JobError;
use thiserror::Error;

/// Errors returned from handlers. Rendered as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Job(#[from] JobError),

    /// The request body could not be read as JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Job(JobError::Validation(_)) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Job(JobError::DuplicateActive(_))
            | Self::Job(JobError::InvalidTransition { .. })
            | Self::Job(JobError::AlreadyScheduled(_)) => StatusCode::CONFLICT,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
