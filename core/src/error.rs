use serde::Serialize;

use crate::agent::AgentError;
use crate::reduce::ReduceError;

/// Structured error response returned at the API boundary.
///
/// Messages stay generic on purpose; the real failure detail is logged
/// server-side and never surfaced to the caller.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "rate_limited")
    pub error: String,
    /// Generic description safe to show to a caller
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for tracing and debugging
    pub request_id: String,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const SESSION_REJECTED: &str = "session_rejected";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Closed failure taxonomy for the guarded pipeline.
///
/// Every stage failure must pick a variant; nothing falls into a
/// catch-all. The API boundary matches this enum exhaustively to decide
/// the user-visible shape.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input failed length or character-class validation.
    #[error("input failed validation")]
    InvalidInput,
    /// A required request field was absent or empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// The caller's sliding window is full. A policy decision, not a
    /// fault, kept distinguishable from internal errors in logs.
    #[error("rate limit exceeded")]
    RateLimited,
    /// The session id was refused by the session store.
    #[error("session rejected")]
    SessionRejected,
    /// The agent collaborator failed to produce a response.
    #[error("agent invocation failed: {0}")]
    Agent(#[from] AgentError),
    /// The agent response could not be reduced.
    #[error(transparent)]
    Reduce(#[from] ReduceError),
    /// Anything else. Detail is logged, never surfaced.
    #[error("internal error: {0}")]
    Internal(String),
}
