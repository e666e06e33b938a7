//! Request identification and per-request stages.
//!
//! # Responsibilities
//! - Read the request ID assigned by the middleware stack
//! - Name the terminal outcome of each request for logs and metrics
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (tower-http layer)
//! - Outcomes mirror the request state machine:
//!   `Received → Filtered → {Rejected | Forwarding → Responded} → Closed`

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID set by `SetRequestIdLayer`, or `"unknown"` outside the stack.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// How a request left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Preflight answered locally.
    Preflight,
    /// Usage page served.
    Usage,
    /// Refused by the origin policy filter.
    Rejected,
    /// Upstream response relayed.
    Responded,
    /// Forwarding failed (502/504/400).
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Usage => "usage",
            Outcome::Rejected => "rejected",
            Outcome::Responded => "responded",
            Outcome::Failed => "failed",
        }
    }
}
