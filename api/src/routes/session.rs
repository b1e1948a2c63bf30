use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    Json, Router,
    routing::{delete, post},
};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/session", post(create_session))
        .route("/v1/session/{id}", delete(end_session))
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Start a new conversation session.
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create(Utc::now()).await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// End a session. Idempotent: ending an unknown or already-ended
/// session succeeds.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    state.sessions.end(&session_id).await;
    StatusCode::NO_CONTENT
}
