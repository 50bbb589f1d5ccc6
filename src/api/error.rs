use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::error::{DraftError, FieldError, ScheduleError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError::Draft(DraftError::Schedule(err))
    }
}

/// Error payload: `{ "success": false, "error": ..., "kind": ..., "fields": [...] }`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Draft(_) | ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Draft(DraftError::Schedule(err)) => err.kind(),
            ApiError::Draft(DraftError::Fields(_)) => "invalid_fields",
            ApiError::MalformedPayload(_) => "malformed_payload",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let message = match &self {
            // Store details stay in the log
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                "Internal server error".to_string()
            }
            other => {
                warn!(status = status.as_u16(), kind, "Request rejected: {}", other);
                other.to_string()
            }
        };

        let fields = match self {
            ApiError::Draft(DraftError::Fields(fields)) => fields,
            _ => Vec::new(),
        };

        let body = ErrorBody {
            success: false,
            error: message,
            kind,
            fields,
        };

        (status, Json(body)).into_response()
    }
}
