//! Per-request error taxonomy and its HTTP mapping.
//!
//! Fatal startup errors live next to the code that produces them
//! (`net::BindError`, `config::ConfigError`); everything here is terminal
//! for one request only and is turned into a response, never propagated.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::policy::PolicyRejection;

/// Failure talking to the target.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("no response from upstream within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Unreachable(String),
}

impl UpstreamError {
    /// Build an `Unreachable` error from a client error and its source chain.
    pub fn unreachable(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut reason = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Unreachable(reason)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "upstream_timeout",
            Self::Unreachable(_) => "upstream_unreachable",
        }
    }
}

/// Any reason a single proxied request did not produce an upstream response.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Policy(#[from] PolicyRejection),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Policy(rejection) => rejection.status(),
            Self::Upstream(err) => err.status(),
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Upstream(err) => (
                status,
                Json(json!({ "error": err.code(), "reason": err.to_string() })),
            )
                .into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
