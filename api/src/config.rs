use palisade_core::rate_limit::{RateLimitConfig, RateScope};
use palisade_core::sanitize::DEFAULT_MAX_INPUT_LENGTH;
use palisade_core::session::{DEFAULT_SESSION_TIMEOUT_SECS, RecoveryPolicy, SessionConfig};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_input_length: usize,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    /// Base URL of the agent invocation backend.
    pub agent_url: String,
    /// Base URL of the citation object store.
    pub object_store_url: String,
    /// When set, audit log entries include request payloads.
    pub debug_audit: bool,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            max_input_length: env_parse("MAX_INPUT_LENGTH", DEFAULT_MAX_INPUT_LENGTH),
            session: SessionConfig {
                timeout_secs: env_parse("SESSION_TIMEOUT", DEFAULT_SESSION_TIMEOUT_SECS),
                recovery: recovery_policy_from(
                    &std::env::var("SESSION_RECOVERY").unwrap_or_default(),
                ),
            },
            rate_limit: RateLimitConfig {
                max_calls: env_parse("MAX_CALLS_PER_MINUTE", 60),
                window_secs: env_parse("RATE_WINDOW_SECONDS", 60),
                scope: rate_scope_from(&std::env::var("RATE_SCOPE").unwrap_or_default()),
            },
            agent_url: std::env::var("AGENT_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            object_store_url: std::env::var("OBJECT_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            debug_audit: std::env::var("PALISADE_DEBUG_AUDIT")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            port: env_parse("PORT", 3000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn recovery_policy_from(value: &str) -> RecoveryPolicy {
    match value.to_lowercase().as_str() {
        "reject" => RecoveryPolicy::Reject,
        _ => RecoveryPolicy::Recreate,
    }
}

fn rate_scope_from(value: &str) -> RateScope {
    match value.to_lowercase().as_str() {
        "global" => RateScope::Global,
        _ => RateScope::PerCaller,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_policy_defaults_to_recreate() {
        assert_eq!(recovery_policy_from(""), RecoveryPolicy::Recreate);
        assert_eq!(recovery_policy_from("anything"), RecoveryPolicy::Recreate);
        assert_eq!(recovery_policy_from("REJECT"), RecoveryPolicy::Reject);
    }

    #[test]
    fn rate_scope_defaults_to_per_caller() {
        assert_eq!(rate_scope_from(""), RateScope::PerCaller);
        assert_eq!(rate_scope_from("Global"), RateScope::Global);
    }
}
