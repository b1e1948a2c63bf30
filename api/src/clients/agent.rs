//! HTTP-backed agent collaborator.
//!
//! The backend is a black box: one POST carrying the sanitized question
//! and session id, one JSON envelope back containing the full ordered
//! event sequence. Tracing is always requested so the reducer can see
//! tool observations.

use palisade_core::agent::{AgentClient, AgentError, AgentResponse};
use serde::Serialize;

pub struct HttpAgentClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    input_text: &'a str,
    session_id: &'a str,
    enable_trace: bool,
}

impl HttpAgentClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(&self, question: &str, session_id: &str) -> Result<AgentResponse, AgentError> {
        let response = self
            .client
            .post(format!("{}/invoke", self.base_url))
            .json(&InvokeRequest {
                input_text: question,
                session_id,
                enable_trace: true,
            })
            .send()
            .await
            .map_err(|err| AgentError::Transport(err.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|err| AgentError::Transport(err.to_string()))?;

        response
            .json::<AgentResponse>()
            .await
            .map_err(|err| AgentError::Decode(err.to_string()))
    }
}
