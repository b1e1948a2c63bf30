//! Redaction-aware audit logging around guarded operations.
//!
//! Every guarded operation emits an entry before and after invocation.
//! Request payloads are sensitive: they appear only when the debug flag
//! is set, otherwise a placeholder line is logged in their place.

/// Log the start of a guarded operation.
pub fn operation_start(operation: &str, payload: &str, debug: bool) {
    if debug {
        tracing::info!(operation, payload, "audit: operation invoked");
    } else {
        tracing::info!(
            operation,
            payload = "<withheld; set PALISADE_DEBUG_AUDIT to log payloads>",
            "audit: operation invoked"
        );
    }
}

/// Log the successful completion of a guarded operation.
pub fn operation_end(operation: &str) {
    tracing::info!(operation, "audit: operation completed");
}

/// Log a contained failure of a guarded operation.
pub fn operation_failed(operation: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(operation, error = %error, "audit: operation failed");
}
