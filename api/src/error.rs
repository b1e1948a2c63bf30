use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use palisade_core::error::{ApiError, PipelineError, codes};

/// Internal error type that converts to structured API responses.
///
/// User-facing messages are generic by design; the underlying failure
/// detail is logged where the error is constructed and never leaves the
/// process.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation { field: Option<String> },
    /// Sliding-window or edge rate limit hit (429)
    RateLimited,
    /// Session id refused by the store (401)
    SessionRejected,
    /// Internal error (500)
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation { field } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: codes::VALIDATION_FAILED.to_string(),
                    message: "Invalid input".to_string(),
                    field,
                    request_id,
                },
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiError {
                    error: codes::RATE_LIMITED.to_string(),
                    message: "Too many requests".to_string(),
                    field: None,
                    request_id,
                },
            ),
            AppError::SessionRejected => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: codes::SESSION_REJECTED.to_string(),
                    message: "Session is not valid".to_string(),
                    field: None,
                    request_id,
                },
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError {
                    error: codes::INTERNAL_ERROR.to_string(),
                    message: "An internal error occurred".to_string(),
                    field: None,
                    request_id,
                },
            ),
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput => AppError::Validation { field: None },
            PipelineError::MissingField(field) => AppError::Validation {
                field: Some(field.to_string()),
            },
            PipelineError::RateLimited => AppError::RateLimited,
            PipelineError::SessionRejected => AppError::SessionRejected,
            PipelineError::Agent(ref cause) => {
                tracing::error!(error = %cause, "agent invocation failed");
                AppError::Internal
            }
            PipelineError::Reduce(ref cause) => {
                tracing::error!(error = %cause, "response reduction failed");
                AppError::Internal
            }
            PipelineError::Internal(ref cause) => {
                tracing::error!(error = %cause, "internal pipeline error");
                AppError::Internal
            }
        }
    }
}
