use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clipstudio_cloud::{DelegateError, StorageError};
use clipstudio_core::error::CoreError;
use clipstudio_core::ffmpeg::EncoderError;
use serde_json::json;

use crate::pipeline::export::ExportError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP and pipeline specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `clipstudio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An ML delegate failed or returned nothing.
    #[error("Upstream error: {0}")]
    Upstream(#[from] DelegateError),

    /// The object store rejected or lost an upload.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Media reached the object store but recording it failed.
    #[error("Persisting {url} failed: {source}")]
    Persistence {
        /// The stored URL no row now references.
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// A local export failed before its response started.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Pipeline errors ---
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "ML delegate failed");
                let message = match err.upstream_status() {
                    Some(status) => format!("ML processing failed (upstream status {status})"),
                    None => "ML processing failed".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", message)
            }
            AppError::Storage(err) => {
                tracing::error!(error = %err, "Object store upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to store media".to_string(),
                )
            }
            AppError::Persistence { url, source } => {
                tracing::error!(orphaned_url = %url, error = %source, "Stored media was not recorded");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Media was stored but could not be saved".to_string(),
                )
            }
            AppError::Export(err) => {
                tracing::error!(error = %err, "Export failed");
                let message = match err {
                    ExportError::Encoder(EncoderError::Timeout(_)) => "Export timed out",
                    ExportError::Download(_) => "Failed to fetch clip",
                    _ => "Export failed",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_FAILED",
                    message.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint));
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_username" => "Username is already in use".to_string(),
        "uq_users_email" => "Email is already in use".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
