//! Backend capability interface.
//!
//! The registry and the health monitor only ever see `dyn Upstream`, so
//! new backend variants plug in without type inspection.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

use crate::load_balancer::errors::ForwardError;

/// Everything the dispatcher and health monitor need from a backend.
#[async_trait]
pub trait Upstream: Send + Sync + std::fmt::Debug {
    /// Immutable endpoint identifier (scheme + host[:port]).
    fn address(&self) -> &str;

    /// Current liveness. Safe to call concurrently with `set_alive`.
    fn is_alive(&self) -> bool;

    /// Overwrite liveness; last writer wins.
    fn set_alive(&self, alive: bool);

    /// Probe the backend's health endpoint, record the outcome through
    /// `set_alive` and return it.
    async fn probe_health(&self) -> bool;

    /// Forward one request. On failure the backend is marked not alive
    /// before the error is returned.
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError>;
}

/// Shared handle stored in the registry.
pub type SharedUpstream = Arc<dyn Upstream>;
