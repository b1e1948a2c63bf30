//! Per-caller sliding-window admission control for the pipeline stage.
//!
//! This is the session-level throttle; the HTTP edge carries its own
//! per-IP limits in `palisade-api`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

/// Bucket key used when all callers share one window.
pub const GLOBAL_BUCKET: &str = "default";

/// Identity source for rate-limit buckets.
///
/// `Global` throttles the whole fleet as one caller, the behavior the
/// system falls back to when no caller identity is propagated. Surfaced
/// as configuration rather than an implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    PerCaller,
    Global,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_calls: usize,
    pub window_secs: i64,
    pub scope: RateScope,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 60,
            window_secs: 60,
            scope: RateScope::PerCaller,
        }
    }
}

/// Sliding-window rate limiter keyed by caller id.
///
/// One ordered timestamp list per caller, pruned to the trailing window
/// on every admission check. The write lock serializes concurrent checks
/// for the same caller; two racing calls cannot both observe room in
/// the window.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Admit or deny a call at `now`. Admission records the call;
    /// denial leaves the window untouched.
    pub async fn admit(&self, caller_id: &str, now: DateTime<Utc>) -> bool {
        let key = match self.config.scope {
            RateScope::PerCaller => caller_id,
            RateScope::Global => GLOBAL_BUCKET,
        };
        let cutoff = now - Duration::seconds(self.config.window_secs);

        let mut windows = self.windows.write().await;
        let window = windows.entry(key.to_string()).or_default();
        window.retain(|call_time| *call_time > cutoff);

        if window.len() >= self.config.max_calls {
            tracing::warn!(
                caller_id = key,
                calls_in_window = window.len(),
                max_calls = self.config.max_calls,
                "rate limit exceeded"
            );
            return false;
        }

        window.push(now);
        true
    }

    /// Drop caller entries whose windows are entirely stale. An
    /// optimization for long-lived processes, not a correctness
    /// requirement.
    pub async fn evict_idle(&self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(self.config.window_secs);
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| window.iter().any(|call_time| *call_time > cutoff));
    }
}
