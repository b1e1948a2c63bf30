//! Custom extractors that convert axum rejections to structured
//! `AppError` responses.
//!
//! Use `AppJson<T>` in place of `axum::Json<T>` in handler signatures:
//! deserialization failures produce the structured JSON error body
//! instead of axum's plain-text 422, and the serde detail is logged
//! rather than surfaced.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to a structured validation error. The body
/// text stays in the logs; the caller sees only the field hint.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = extract_field_from_serde_message(&body_text);
    tracing::warn!(detail = %body_text, "request body rejected");

    AppError::Validation {
        field: Some(field_hint.unwrap_or_else(|| "body".to_string())),
    }
}

/// Try to extract a field name from serde's error messages.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    // Pattern: "missing field `fieldname`" / "unknown field `fieldname`"
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}
