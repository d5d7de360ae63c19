//! Request dispatcher.
//!
//! # Responsibilities
//! - Own the backend registry and the round-robin cursor
//! - Select a live backend per attempt
//! - Buffer the request body once so it can be replayed across attempts
//! - Forward with a bounded number of attempts, then give up with 503
//! - Launch the health monitor over the same registry

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::BalancerConfig;
use crate::health::active::HealthMonitor;
use crate::http::request::RequestIdExt;
use crate::load_balancer::backend::BackendSettings;
use crate::load_balancer::errors::{BackendError, DispatchError};
use crate::load_balancer::pool::BackendPool;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::upstream::SharedUpstream;
use crate::observability::metrics;
use crate::resilience::retries::RetryPolicy;

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Single entry point for inbound requests.
///
/// Created once at startup and shared (behind an `Arc`) by every request task.
#[derive(Debug)]
pub struct Dispatcher {
    port: String,
    pool: BackendPool,
    cursor: RoundRobin,
    retry: RetryPolicy,
    max_body_bytes: usize,
}

impl Dispatcher {
    /// Build a dispatcher for `port` over HTTP backends at `addresses`,
    /// using default timeouts and retry policy.
    pub fn new<S: AsRef<str>>(port: impl Into<String>, addresses: &[S]) -> Result<Self, BackendError> {
        let config = BalancerConfig::default();
        let pool = BackendPool::from_addresses(
            addresses,
            BackendSettings::from_config(&config),
            Duration::from_secs(config.timeouts.connect_secs),
        )?;
        Ok(Self::with_pool(port, pool))
    }

    /// Build everything from a validated configuration.
    pub fn from_config(config: &BalancerConfig) -> Result<Self, BackendError> {
        let pool = BackendPool::from_config(config)?;
        Ok(Self::with_pool(config.listener.port.clone(), pool)
            .with_retry_policy(RetryPolicy::from_config(&config.retries))
            .with_body_limit(config.limits.max_body_bytes))
    }

    /// Wrap an existing registry.
    pub fn with_pool(port: impl Into<String>, pool: BackendPool) -> Self {
        Self {
            port: port.into(),
            pool,
            cursor: RoundRobin::new(),
            retry: RetryPolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Configured listening port.
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    /// Next alive backend in round-robin order, or `None` when the registry
    /// is empty or nothing is alive.
    pub fn select_backend(&self) -> Option<SharedUpstream> {
        self.cursor.next_server(&self.pool)
    }

    /// Health monitor probing this dispatcher's backends every `interval`.
    pub fn health_monitor(&self, interval: Duration) -> HealthMonitor {
        HealthMonitor::new(self.pool.clone(), interval)
    }

    /// Spawn the health monitor as a background task. It stops when
    /// `shutdown` fires.
    pub fn run_health_monitor(
        &self,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let monitor = self.health_monitor(interval);
        tokio::spawn(monitor.run(shutdown))
    }

    /// Serve one request: the backend's response, or an error response.
    pub async fn handle_request(&self, request: Request<Body>) -> Response {
        let started = Instant::now();
        let method = request.method().clone();
        let request_id = request.request_id().to_string();

        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(request_id = %request_id, error = %err, "Request not served");
                if matches!(err, DispatchError::NoBackends | DispatchError::Exhausted { .. }) {
                    metrics::record_unavailable();
                }
                metrics::record_request(method.as_str(), err.status().as_u16(), "none", started);
                err.into_response()
            }
        }
    }

    /// Dispatch loop behind `handle_request`.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response, DispatchError> {
        let started = Instant::now();
        let request_id = request.request_id().to_string();
        let (parts, body) = request.into_parts();
        let body = self.buffer_body(&parts.headers, body).await?;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                metrics::record_retry();
                let delay = self.retry.delay_before(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            let Some(backend) = self.select_backend() else {
                tracing::debug!(request_id = %request_id, attempt, "No alive backend");
                continue;
            };

            tracing::debug!(
                request_id = %request_id,
                backend = %backend.address(),
                attempt,
                "Forwarding request"
            );

            match backend.forward(replay(&parts, &body)).await {
                Ok(response) => {
                    metrics::record_request(
                        parts.method.as_str(),
                        response.status().as_u16(),
                        backend.address(),
                        started,
                    );
                    return Ok(response);
                }
                Err(e) => {
                    tracing::info!(
                        request_id = %request_id,
                        backend = %backend.address(),
                        attempt,
                        error = %e,
                        "Attempt failed"
                    );
                }
            }
        }

        if self.pool.is_empty() {
            Err(DispatchError::NoBackends)
        } else {
            Err(DispatchError::Exhausted {
                attempts: self.retry.max_attempts,
            })
        }
    }

    async fn buffer_body(&self, headers: &HeaderMap, body: Body) -> Result<Bytes, DispatchError> {
        let limit = self.max_body_bytes;
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(DispatchError::BodyTooLarge { limit });
        }

        axum::body::to_bytes(body, limit).await.map_err(|e| {
            if exceeded_limit(&e) {
                DispatchError::BodyTooLarge { limit }
            } else {
                DispatchError::BodyRead(e.to_string())
            }
        })
    }
}

/// Whether buffering stopped because the body outgrew the limit.
fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Fresh copy of the inbound request carrying the buffered body.
fn replay(parts: &Parts, body: &Bytes) -> Request<Body> {
    let mut request = Request::new(Body::from(body.clone()));
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    if let Some(info) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        request.extensions_mut().insert(info.clone());
    }
    request
}
