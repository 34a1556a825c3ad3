use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// The application's error type.
///
/// Ownership mismatches are reported as [`AppError::NotFound`] with the same
/// body as a genuinely missing record, so callers cannot probe for the
/// existence of other users' records.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range input, rejected before any storage call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record or user absent, or an ownership mismatch.
    #[error("Not found")]
    NotFound,

    /// A uniqueness violation (e.g. duplicate username).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A broken internal invariant, e.g. an id-scoped delete removing more
    /// than one row. Logged with details, surfaced as a generic 500.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Missing or invalid credentials.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// An unexpected internal failure (hashing, token generation, ...).
    #[error("Internal error: {0}")]
    Internal(String),

    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => {
                tracing::debug!(error = %msg, "Request rejected by validation");
                (StatusCode::BAD_REQUEST, msg)
            }

            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),

            AppError::Conflict(msg) => {
                tracing::warn!(error = %msg, "Conflict");
                (StatusCode::CONFLICT, msg)
            }

            AppError::Invariant(ref msg) => {
                tracing::error!(error = %msg, "Internal invariant violated");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }

            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),

            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),

            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }

            AppError::Database(ref e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
