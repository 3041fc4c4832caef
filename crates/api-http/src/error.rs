//! API Error Types
//!
//! Maps application errors to HTTP status codes and a JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hookq_core::error::AppError;
use serde::Serialize;
use tracing::error;

/// Machine-readable error codes carried in `error.code`
pub mod code {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const NOT_FOUND: &str = "not_found";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::Validation(_) | AppError::Domain(_) => {
                (StatusCode::BAD_REQUEST, code::VALIDATION_ERROR)
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, code::NOT_FOUND),
            AppError::Storage(_) | AppError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, code::STORAGE_ERROR)
            }
            AppError::Config(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, code::INTERNAL_ERROR)
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
