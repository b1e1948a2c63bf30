use std::sync::Arc;

use palisade_core::session::SessionStore;

use crate::pipeline::Pipeline;

/// Shared application state. The limiter and session store are
/// constructed once at startup and passed by reference; no
/// process-global mutable state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub sessions: Arc<SessionStore>,
}
