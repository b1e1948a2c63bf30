//! Keyed session records with TTL expiry and lazy recreation.

use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::RwLock;

/// Default inactivity timeout in seconds (1 hour).
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 3600;

/// What `validate` does when the presented id has no record.
///
/// `Recreate` silently builds a fresh record for the presented id, a
/// restart-tolerance workaround, not a security property: a guessed or
/// expired id regains a valid session. `Reject` refuses unknown ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    Recreate,
    Reject,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub timeout_secs: i64,
    pub recovery: RecoveryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            recovery: RecoveryPolicy::Recreate,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
}

/// In-memory session store. The write lock serializes concurrent
/// validation for the same id.
pub struct SessionStore {
    config: SessionConfig,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session with a fresh random id (32 bytes of entropy,
    /// URL-safe encoding).
    pub async fn create(&self, now: DateTime<Utc>) -> String {
        let session_id = generate_session_id();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id.clone(),
            SessionRecord {
                created_at: now,
                last_accessed: now,
            },
        );
        tracing::info!("session created");
        session_id
    }

    /// Validate a session id and refresh its `last_accessed` time.
    ///
    /// A missing record is handled per the configured [`RecoveryPolicy`].
    /// An expired record is removed and validation fails; presenting the
    /// same id again afterwards goes through the missing-record path and
    /// never revives the old timestamps.
    pub async fn validate(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.sessions.write().await;

        let Some(record) = sessions.get_mut(session_id) else {
            return match self.config.recovery {
                RecoveryPolicy::Recreate => {
                    tracing::info!("session not found, recreating");
                    sessions.insert(
                        session_id.to_string(),
                        SessionRecord {
                            created_at: now,
                            last_accessed: now,
                        },
                    );
                    true
                }
                RecoveryPolicy::Reject => {
                    tracing::warn!("unknown session rejected");
                    false
                }
            };
        };

        if now - record.last_accessed > Duration::seconds(self.config.timeout_secs) {
            tracing::info!("session timed out");
            sessions.remove(session_id);
            return false;
        }

        record.last_accessed = now;
        true
    }

    /// End a session by removing its record. No-op if absent.
    pub async fn end(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_some() {
            tracing::info!("session ended");
        }
    }

    /// Creation time of a session, if it exists. Diagnostic accessor;
    /// validation does not consult this.
    pub async fn created_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|record| record.created_at)
    }
}

/// 32 random bytes, URL-safe base64 without padding.
fn generate_session_id() -> String {
    let bytes: Vec<u8> = (0..32).map(|_| rand::thread_rng().r#gen::<u8>()).collect();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes)
}
