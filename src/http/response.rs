//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a backend response into one the client can receive
//! - Strip hop-by-hop headers
//!
//! # Design Decisions
//! - Response bodies stream straight through; only request bodies are buffered
//! - Upstream error statuses pass through untouched (they are not retried)

use axum::body::Body;
use axum::http::Response;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

/// Convert a response received from a backend into the client-facing one.
pub fn into_downstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
