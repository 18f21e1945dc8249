use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::utils::qr::QrError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `EMAIL_TAKEN`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `UPSTREAM_FAILURE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "No file uploaded")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    EmailTaken,
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// The session is valid but lacks the role the route requires.
    PermissionDenied,
    NotFound(String),
    /// Object storage or QR generation failed. The message reaches the caller.
    Upstream(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EmailTaken => StatusCode::BAD_REQUEST,
            AppError::TokenMissing
            | AppError::TokenInvalid
            | AppError::InvalidCredentials
            | AppError::PermissionDenied => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let (code, message) = match self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg),
            AppError::EmailTaken => ("EMAIL_TAKEN", "User already exists".into()),
            AppError::TokenMissing => ("TOKEN_MISSING", "Authentication required".into()),
            AppError::TokenInvalid => ("TOKEN_INVALID", "Invalid or expired session".into()),
            AppError::InvalidCredentials => ("INVALID_CREDENTIALS", "Invalid password".into()),
            AppError::PermissionDenied => ("PERMISSION_DENIED", "You are not authorized".into()),
            AppError::NotFound(msg) => ("NOT_FOUND", msg),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                ("UPSTREAM_FAILURE", msg)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ("INTERNAL_ERROR", "An unexpected error occurred".into())
            }
        };
        ErrorBody { code, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object '{key}' not found")),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            other => AppError::Upstream(format!("File upload failed: {other}")),
        }
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        AppError::Upstream(err.to_string())
    }
}
