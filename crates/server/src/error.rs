use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Insufficient resources available: requested {requested}, available {available}")]
    InsufficientResource { requested: i32, available: i32 },
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl OpsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        OpsError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        OpsError::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OpsError::Unauthorized => StatusCode::UNAUTHORIZED,
            OpsError::NotFound(_) => StatusCode::NOT_FOUND,
            OpsError::Validation(_) => StatusCode::BAD_REQUEST,
            OpsError::InsufficientResource { .. } => StatusCode::CONFLICT,
            OpsError::Upstream(_) | OpsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to API callers. Store errors never leak.
    pub fn public_message(&self) -> String {
        match self {
            OpsError::Database(_) => "Database operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

impl IntoResponse for OpsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
