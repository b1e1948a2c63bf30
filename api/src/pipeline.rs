//! The guarded pipeline wrapped around agent invocation.
//!
//! Stage order, outermost to innermost: error containment (the caller
//! matches the closed [`PipelineError`] enum at the boundary) → audit
//! logging → input validation → session admission → rate limiting →
//! agent invocation → reduction → source resolution. The order is
//! visible in [`Pipeline::ask`]; stages share no hidden context beyond
//! the state objects constructed at startup.

use std::sync::Arc;

use chrono::Utc;
use palisade_core::agent::AgentClient;
use palisade_core::citations::{self, ObjectStore};
use palisade_core::error::PipelineError;
use palisade_core::rate_limit::RateLimiter;
use palisade_core::reduce::{self, ReducedSources};
use palisade_core::sanitize;
use palisade_core::session::SessionStore;

use crate::audit;

/// Pipeline input contract: both fields are required; either missing or
/// empty is a hard rejection before the agent is invoked.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub session_id: String,
}

/// Pipeline output contract.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub source: String,
}

pub struct Pipeline {
    max_input_length: usize,
    debug_audit: bool,
    limiter: Arc<RateLimiter>,
    sessions: Arc<SessionStore>,
    agent: Arc<dyn AgentClient>,
    object_store: Arc<dyn ObjectStore>,
}

impl Pipeline {
    pub fn new(
        max_input_length: usize,
        debug_audit: bool,
        limiter: Arc<RateLimiter>,
        sessions: Arc<SessionStore>,
        agent: Arc<dyn AgentClient>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            max_input_length,
            debug_audit,
            limiter,
            sessions,
            agent,
            object_store,
        }
    }

    /// Run one question through the full guard chain.
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse, PipelineError> {
        audit::operation_start("ask", &request.query, self.debug_audit);
        let result = self.ask_inner(request).await;
        match &result {
            Ok(_) => audit::operation_end("ask"),
            Err(err) => audit::operation_failed("ask", err),
        }
        result
    }

    async fn ask_inner(&self, request: AskRequest) -> Result<AskResponse, PipelineError> {
        if request.query.is_empty() {
            return Err(PipelineError::MissingField("query"));
        }
        if request.session_id.is_empty() {
            return Err(PipelineError::MissingField("session_id"));
        }

        let question = sanitize::sanitize_with_limit(&request.query, self.max_input_length)
            .map_err(|_| PipelineError::InvalidInput)?;

        let now = Utc::now();
        if !self.sessions.validate(&request.session_id, now).await {
            return Err(PipelineError::SessionRejected);
        }
        if !self.limiter.admit(&request.session_id, now).await {
            return Err(PipelineError::RateLimited);
        }

        let response = self
            .agent
            .invoke(question.as_str(), &request.session_id)
            .await?;
        let reduced = reduce::reduce(&response)?;

        let source = match reduced.sources {
            // Trace-derived query is the final source, verbatim.
            ReducedSources::Query(query) => query,
            ReducedSources::Documents(uris) => {
                citations::resolve(self.object_store.as_ref(), &uris).await
            }
        };

        Ok(AskResponse {
            answer: reduced.answer_text,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::agent::{
        ActionGroupInvocationOutput, AgentError, AgentEvent, AgentResponse, Attribution,
        ChunkEvent, Citation, OBSERVATION_ACTION_GROUP, Observation, OrchestrationTrace,
        ReferenceContent, ReferenceLocation, RetrievedReference, S3Location, TraceEvent,
        TracePayload,
    };
    use palisade_core::citations::ObjectStoreError;
    use palisade_core::rate_limit::{RateLimitConfig, RateScope};
    use palisade_core::session::{RecoveryPolicy, SessionConfig};
    use std::sync::Mutex;

    /// Agent stub returning a canned envelope and recording invocations.
    struct StubAgent {
        response: AgentResponse,
        invocations: Mutex<Vec<(String, String)>>,
    }

    impl StubAgent {
        fn new(response: AgentResponse) -> Self {
            Self {
                response,
                invocations: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl AgentClient for StubAgent {
        async fn invoke(
            &self,
            question: &str,
            session_id: &str,
        ) -> Result<AgentResponse, AgentError> {
            self.invocations
                .lock()
                .unwrap()
                .push((question.to_string(), session_id.to_string()));
            Ok(self.response.clone())
        }
    }

    struct StubStore;

    #[async_trait::async_trait]
    impl ObjectStore for StubStore {
        async fn fetch_json(
            &self,
            _bucket: &str,
            key: &str,
        ) -> Result<serde_json::Value, ObjectStoreError> {
            if key == "doc.json" {
                Ok(serde_json::json!({
                    "Topic": "Injection basics",
                    "Url": "https://example.com/injection"
                }))
            } else {
                Err(ObjectStoreError::NotFound {
                    bucket: "b".into(),
                    key: key.into(),
                })
            }
        }
    }

    fn chunk(text: &str) -> AgentEvent {
        AgentEvent {
            chunk: Some(ChunkEvent {
                bytes: Some(text.as_bytes().to_vec()),
                attribution: None,
            }),
            trace: None,
        }
    }

    fn cited_chunk(text: &str, uri: &str) -> AgentEvent {
        AgentEvent {
            chunk: Some(ChunkEvent {
                bytes: Some(text.as_bytes().to_vec()),
                attribution: Some(Attribution {
                    citations: vec![Citation {
                        generated_response_part: None,
                        retrieved_references: vec![RetrievedReference {
                            content: Some(ReferenceContent {
                                text: Some("passage".to_string()),
                            }),
                            location: Some(ReferenceLocation {
                                s3_location: Some(S3Location {
                                    uri: Some(uri.to_string()),
                                }),
                            }),
                        }],
                    }],
                }),
            }),
            trace: None,
        }
    }

    fn action_group_trace(output: &str) -> AgentEvent {
        AgentEvent {
            chunk: None,
            trace: Some(TraceEvent {
                trace: Some(TracePayload {
                    orchestration_trace: Some(OrchestrationTrace {
                        observation: Some(Observation {
                            observation_type: Some(OBSERVATION_ACTION_GROUP.to_string()),
                            action_group_invocation_output: Some(ActionGroupInvocationOutput {
                                text: Some(output.to_string()),
                            }),
                        }),
                    }),
                }),
            }),
        }
    }

    fn pipeline_with(events: Vec<AgentEvent>, max_calls: usize) -> Pipeline {
        Pipeline::new(
            1000,
            false,
            Arc::new(RateLimiter::new(RateLimitConfig {
                max_calls,
                window_secs: 60,
                scope: RateScope::PerCaller,
            })),
            Arc::new(SessionStore::new(SessionConfig {
                timeout_secs: 3600,
                recovery: RecoveryPolicy::Recreate,
            })),
            Arc::new(StubAgent::new(AgentResponse {
                completion: Some(events),
            })),
            Arc::new(StubStore),
        )
    }

    fn request(query: &str) -> AskRequest {
        AskRequest {
            query: query.to_string(),
            session_id: "session-1".to_string(),
        }
    }

    #[tokio::test]
    async fn answers_with_resolved_citations() {
        let pipeline = pipeline_with(
            vec![chunk("Use parameterized "), cited_chunk("queries.", "s3://b/doc.json")],
            10,
        );
        let response = pipeline.ask(request("How do I stop injection?")).await.unwrap();
        assert_eq!(response.answer, "Use parameterized queries.");
        assert_eq!(
            response.source,
            "1. [Injection basics](https://example.com/injection)\n\n"
        );
    }

    #[tokio::test]
    async fn trace_query_becomes_the_source_verbatim() {
        let pipeline = pipeline_with(
            vec![
                cited_chunk("Found 3 users.", "s3://b/doc.json"),
                action_group_trace("SELECT name FROM users LIMIT 3\nReturned information: rows"),
            ],
            10,
        );
        let response = pipeline.ask(request("list users")).await.unwrap();
        assert_eq!(response.source, "SELECT name FROM users LIMIT 3");
    }

    #[tokio::test]
    async fn empty_fields_reject_before_invocation() {
        let pipeline = pipeline_with(vec![chunk("unused")], 10);
        let err = pipeline
            .ask(AskRequest {
                query: String::new(),
                session_id: "s".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("query")));

        let err = pipeline
            .ask(AskRequest {
                query: "q".into(),
                session_id: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField("session_id")));
    }

    #[tokio::test]
    async fn disallowed_characters_reject_before_invocation() {
        let pipeline = pipeline_with(vec![chunk("unused")], 10);
        let err = pipeline.ask(request("run `this`")).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput));
    }

    #[tokio::test]
    async fn question_is_trimmed_before_the_agent_sees_it() {
        let agent = Arc::new(StubAgent::new(AgentResponse {
            completion: Some(vec![chunk("ok")]),
        }));
        let pipeline = Pipeline::new(
            1000,
            false,
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
            Arc::new(SessionStore::new(SessionConfig::default())),
            agent.clone(),
            Arc::new(StubStore),
        );
        pipeline.ask(request("  spaced question?  ")).await.unwrap();
        let invocations = agent.invocations.lock().unwrap();
        assert_eq!(
            invocations.as_slice(),
            &[("spaced question?".to_string(), "session-1".to_string())]
        );
    }

    #[tokio::test]
    async fn rate_limit_denies_after_max_calls() {
        let pipeline = pipeline_with(vec![chunk("ok")], 2);
        assert!(pipeline.ask(request("one")).await.is_ok());
        assert!(pipeline.ask(request("two")).await.is_ok());
        let err = pipeline.ask(request("three")).await.unwrap_err();
        assert!(matches!(err, PipelineError::RateLimited));
    }

    #[tokio::test]
    async fn unknown_session_rejects_under_reject_policy() {
        let pipeline = Pipeline::new(
            1000,
            false,
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
            Arc::new(SessionStore::new(SessionConfig {
                timeout_secs: 3600,
                recovery: RecoveryPolicy::Reject,
            })),
            Arc::new(StubAgent::new(AgentResponse {
                completion: Some(vec![chunk("ok")]),
            })),
            Arc::new(StubStore),
        );
        let err = pipeline.ask(request("hello")).await.unwrap_err();
        assert!(matches!(err, PipelineError::SessionRejected));
    }

    #[tokio::test]
    async fn missing_completion_surfaces_as_reduce_error() {
        let pipeline = Pipeline::new(
            1000,
            false,
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
            Arc::new(SessionStore::new(SessionConfig::default())),
            Arc::new(StubAgent::new(AgentResponse { completion: None })),
            Arc::new(StubStore),
        );
        let err = pipeline.ask(request("hello")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Reduce(_)));
    }
}
