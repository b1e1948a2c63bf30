//! Data model for the agent collaborator's streamed response, and the
//! trait seam the pipeline invokes it through.
//!
//! The agent returns an envelope holding an ordered, finite sequence of
//! events. Each event may carry a text chunk (with optional citation
//! attribution) and/or an orchestration trace. Field names follow the
//! upstream wire format (camelCase); chunk bytes travel as base64.

use serde::{Deserialize, Serialize};

/// Response envelope. `completion` absent means the agent produced no
/// event sequence at all, which is a hard reduction failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResponse {
    pub completion: Option<Vec<AgentEvent>>,
}

/// One event in the completion sequence. An event may carry a chunk, a
/// trace, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkEvent {
    /// UTF-8 answer text, base64 on the wire.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Grounding evidence attached to generated text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_response_part: Option<GeneratedResponsePart>,
    #[serde(default)]
    pub retrieved_references: Vec<RetrievedReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_response_part: Option<TextResponsePart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ReferenceContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ReferenceLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Outer trace wrapper as it appears in the event stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TracePayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestration_trace: Option<OrchestrationTrace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestrationTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
}

/// Observation type marking a tool/function invocation.
pub const OBSERVATION_ACTION_GROUP: &str = "ACTION_GROUP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub observation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_group_invocation_output: Option<ActionGroupInvocationOutput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionGroupInvocationOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Failure of the agent collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent unreachable: {0}")]
    Transport(String),
    #[error("agent response undecodable: {0}")]
    Decode(String),
}

/// The agent invocation collaborator. Accepts a sanitized question and a
/// session id; returns the full event envelope or an error.
#[async_trait::async_trait]
pub trait AgentClient: Send + Sync {
    async fn invoke(&self, question: &str, session_id: &str) -> Result<AgentResponse, AgentError>;
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
