//! Reduction of the agent's event sequence into one answer, one
//! reference snippet, and a source set.
//!
//! The event stream interleaves narrative text, grounding citations,
//! and tool-execution traces. The reducer separates "what to say" from
//! "where it came from": chunks accumulate into the answer, citation
//! references contribute document URIs, and a tool trace carrying a
//! valid SQL query replaces the URIs outright; structured tool
//! evidence beats incidentally collected documents.

use crate::agent::{AgentResponse, OBSERVATION_ACTION_GROUP, TracePayload};
use crate::query_guard;

/// Where the answer's supporting material came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReducedSources {
    /// Storage URIs collected from citation references, in first-seen
    /// order. Resolved downstream into formatted citations.
    Documents(Vec<String>),
    /// A re-validated query extracted from an action-group trace. Used
    /// verbatim as the final source.
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedResponse {
    pub answer_text: String,
    /// Content text of the last citation reference seen (last write
    /// wins, not accumulated).
    pub reference_text: String,
    pub sources: ReducedSources,
}

#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    /// The envelope carried no completion sequence at all.
    #[error("agent response contains no completion")]
    MissingCompletion,
    /// A chunk payload was not valid UTF-8.
    #[error("chunk payload is not valid UTF-8")]
    InvalidChunk(#[from] std::str::Utf8Error),
}

/// Fold the ordered event sequence into a [`ReducedResponse`].
///
/// Single pass over events, no backtracking; trace processing is
/// deferred to a second pass over the traces collected in order.
pub fn reduce(response: &AgentResponse) -> Result<ReducedResponse, ReduceError> {
    let events = response
        .completion
        .as_ref()
        .ok_or(ReduceError::MissingCompletion)?;

    let mut answer_text = String::new();
    let mut reference_text = String::new();
    let mut source_uris: Vec<String> = Vec::new();
    let mut traces: Vec<&TracePayload> = Vec::new();

    for event in events {
        if let Some(trace_event) = &event.trace
            && let Some(payload) = &trace_event.trace
        {
            traces.push(payload);
        }

        let Some(chunk) = &event.chunk else {
            continue;
        };

        if let Some(bytes) = &chunk.bytes {
            answer_text.push_str(std::str::from_utf8(bytes)?);
        }

        let Some(attribution) = &chunk.attribution else {
            continue;
        };
        for citation in &attribution.citations {
            if let Some(text) = citation
                .generated_response_part
                .as_ref()
                .and_then(|part| part.text_response_part.as_ref())
                .and_then(|part| part.text.as_deref())
            {
                tracing::debug!(response_part = text, "citation response part");
            }

            for reference in &citation.retrieved_references {
                if let Some(text) = reference
                    .content
                    .as_ref()
                    .and_then(|content| content.text.as_deref())
                {
                    reference_text = text.to_string();
                }
                if let Some(uri) = reference
                    .location
                    .as_ref()
                    .and_then(|location| location.s3_location.as_ref())
                    .and_then(|location| location.uri.as_deref())
                {
                    source_uris.push(uri.to_string());
                }
            }
        }
    }

    // Pass 2: a trace-derived query always wins over collected URIs.
    // Last successful extraction across all traces wins.
    let mut extracted_query: Option<String> = None;
    for payload in traces {
        let Some(observation) = payload
            .orchestration_trace
            .as_ref()
            .and_then(|trace| trace.observation.as_ref())
        else {
            continue;
        };
        if observation.observation_type.as_deref() != Some(OBSERVATION_ACTION_GROUP) {
            continue;
        }
        if let Some(output) = observation
            .action_group_invocation_output
            .as_ref()
            .and_then(|output| output.text.as_deref())
            && let Some(query) = query_guard::extract_query(output)
        {
            extracted_query = Some(query);
        }
    }

    let sources = match extracted_query {
        Some(query) => ReducedSources::Query(query),
        None => ReducedSources::Documents(source_uris),
    };

    Ok(ReducedResponse {
        answer_text,
        reference_text,
        sources,
    })
}
