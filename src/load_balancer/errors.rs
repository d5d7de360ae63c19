//! Error types for backend construction, forwarding and dispatch.
//!
//! Backend-local failures (`ForwardError`) never reach the client directly;
//! they demote the backend and are absorbed by the dispatcher's retry loop.
//! Only `DispatchError` crosses into an HTTP response.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while building a backend from its configured address.
///
/// These are the only startup-fatal conditions of the core.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The address could not be parsed as a URL.
    #[error("invalid backend address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    /// The address parsed but cannot be proxied to.
    #[error("unsupported backend address '{address}': {reason}")]
    UnsupportedAddress { address: String, reason: &'static str },
}

/// Failure of a single forward attempt to one backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The backend did not produce response headers in time.
    #[error("backend {address} timed out after {after:?}")]
    Timeout { address: String, after: Duration },

    /// Connection refused, reset, or any other transport failure.
    #[error("transport error talking to {address}: {source}")]
    Transport {
        address: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// The upstream request could not be built.
    #[error("failed to build upstream request: {0}")]
    Request(String),
}

impl ForwardError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout { .. } => "timeout",
            ForwardError::Transport { .. } => "transport",
            ForwardError::Request(_) => "request",
        }
    }
}

/// Reason a health probe reported the backend as not alive.
///
/// Never escalated beyond a log line and a liveness change.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe connection failed: {0}")]
    Transport(#[source] hyper_util::client::legacy::Error),

    #[error("probe returned status {0}")]
    Status(StatusCode),

    #[error("failed to build probe request: {0}")]
    Request(String),
}

/// Request-level failure surfaced to the client.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The registry is empty.
    #[error("no backends configured")]
    NoBackends,

    /// Every attempt either found no live backend or failed to forward.
    #[error("no backend could serve the request after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// Declared request body exceeds the buffering limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The inbound body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoBackends | DispatchError::Exhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            DispatchError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = match &self {
            DispatchError::NoBackends | DispatchError::Exhausted { .. } => {
                "All backends unavailable".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), body).into_response()
    }
}
