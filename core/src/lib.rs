//! Palisade core: the request-guard and response-reduction logic that
//! sits between an end user and a conversational agent backend.
//!
//! Everything here is transport-free: validation, admission control,
//! session lifecycle, and the fold over the agent's event stream. The
//! HTTP surface lives in `palisade-api`.

pub mod agent;
pub mod citations;
pub mod error;
pub mod query_guard;
pub mod rate_limit;
pub mod reduce;
pub mod sanitize;
pub mod session;
