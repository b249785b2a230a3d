//! HTTP error handling and response types.
//!
//! Every failure on the report endpoint ends here and becomes exactly one
//! response. Bodies never carry internal details.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::db::repository::RepositoryError;

/// API error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or expired session credential
    Unauthorized,
    /// Any method other than GET on a read endpoint
    MethodNotAllowed,
    /// Invalid request (missing survey id, malformed query)
    BadRequest(String),
    /// Data source failure while building a report
    Repository(RepositoryError),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::new("Unauthorized")),
            )
                .into_response(),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, HEAD")],
                "Method Not Allowed",
            )
                .into_response(),
            AppError::BadRequest(msg) => {
                warn!(reason = %msg, "Rejected bad request");
                (StatusCode::BAD_REQUEST, Json(ApiError::new("Bad Request"))).into_response()
            }
            AppError::Repository(e) => {
                let ctx = e.context();
                error!(
                    survey_id = ctx.entity_id.as_deref().unwrap_or("-"),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Error fetching survey responses"
                );
                internal_error()
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("Internal Server Error")),
    )
        .into_response()
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
