use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::post};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::pipeline::AskRequest;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/ask", post(ask))
}

/// Run a question through the guarded pipeline.
///
/// Missing `query` or `session_id` rejects in the extractor, before the
/// pipeline or the agent is touched. All pipeline failures surface as
/// one of the structured shapes in [`AppError`]; internal detail never
/// reaches the response body.
pub async fn ask(
    State(state): State<AppState>,
    AppJson(request): AppJson<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.pipeline.ask(request).await?;
    Ok(Json(response))
}
