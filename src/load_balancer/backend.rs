//! HTTP backend.
//!
//! # Responsibilities
//! - Represent a single upstream server by its base URL
//! - Track liveness (alive / not alive)
//! - Probe the backend's health endpoint
//! - Forward requests through the shared HTTP client, demoting on failure

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::BalancerConfig;
use crate::http::request::{append_forwarded_for, strip_hop_by_hop};
use crate::http::response::into_downstream;
use crate::load_balancer::errors::{BackendError, ForwardError, ProbeError};
use crate::load_balancer::upstream::Upstream;
use crate::observability::metrics;
use crate::resilience::timeouts::{bounded, Bounded};

/// HTTP client shared by every backend (and thus one connection pool).
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared client with a bounded connect phase.
pub fn build_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    connector.set_nodelay(true);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Per-backend timing and probe settings.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Path probed by the health monitor.
    pub health_path: String,
    /// Deadline for a single health probe.
    pub probe_timeout: Duration,
    /// Deadline for response headers on a forwarded request.
    pub response_header_timeout: Duration,
}

impl BackendSettings {
    pub fn from_config(config: &BalancerConfig) -> Self {
        Self {
            health_path: config.health_check.path.clone(),
            probe_timeout: Duration::from_secs(config.health_check.timeout_secs),
            response_header_timeout: Duration::from_millis(
                config.forwarding.response_header_timeout_ms,
            ),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
            probe_timeout: Duration::from_secs(2),
            response_header_timeout: Duration::from_secs(2),
        }
    }
}

/// A single upstream HTTP server.
#[derive(Debug)]
pub struct HttpBackend {
    address: String,
    /// `scheme://host[:port]`, pre-computed.
    origin: String,
    /// Base path without a trailing slash; empty for the root.
    base_path: String,
    alive: AtomicBool,
    client: HttpClient,
    settings: BackendSettings,
}

impl HttpBackend {
    /// Create a backend for `address`. Starts out alive.
    pub fn new(
        address: &str,
        client: HttpClient,
        settings: BackendSettings,
    ) -> Result<Self, BackendError> {
        let url = parse_address(address)?;
        Ok(Self {
            address: address.to_string(),
            origin: url.origin().ascii_serialization(),
            base_path: url.path().trim_end_matches('/').to_string(),
            alive: AtomicBool::new(true),
            client,
            settings,
        })
    }

    /// Store the new liveness, logging real transitions.
    fn transition(&self, alive: bool) {
        let previous = self.alive.swap(alive, Ordering::AcqRel);
        if previous != alive {
            if alive {
                tracing::info!(backend = %self.address, "Backend is alive again");
            } else {
                tracing::warn!(backend = %self.address, "Backend marked dead");
            }
        }
        metrics::record_backend_health(&self.address, alive);
    }

    /// Upstream URI: backend origin + base path + inbound path and query.
    fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, ForwardError> {
        let path_and_query = inbound
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        format!("{}{}{}", self.origin, self.base_path, path_and_query)
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ForwardError::Request(e.to_string()))
    }

    fn upstream_request(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        // The client fills Host in from the URI.
        parts.headers.remove(header::HOST);
        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }

        Ok(Request::from_parts(parts, body))
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let uri = format!("{}{}{}", self.origin, self.base_path, self.settings.health_path);
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "rr-proxy-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let response = bounded(self.settings.probe_timeout, self.client.request(request))
            .await
            .map_err(|e| match e {
                Bounded::Failed(source) => ProbeError::Transport(source),
                Bounded::Elapsed(after) => ProbeError::Timeout(after),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(response.status()))
        }
    }
}

#[async_trait]
impl Upstream for HttpBackend {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn set_alive(&self, alive: bool) {
        self.transition(alive);
    }

    async fn probe_health(&self) -> bool {
        let alive = match self.check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(backend = %self.address, error = %e, "Health probe failed");
                false
            }
        };
        self.set_alive(alive);
        alive
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let request = self.upstream_request(request)?;
        let limit = self.settings.response_header_timeout;

        match bounded(limit, self.client.request(request)).await {
            Ok(response) => Ok(into_downstream(response)),
            Err(outcome) => {
                let err = match outcome {
                    Bounded::Failed(source) => ForwardError::Transport {
                        address: self.address.clone(),
                        source,
                    },
                    Bounded::Elapsed(after) => ForwardError::Timeout {
                        address: self.address.clone(),
                        after,
                    },
                };
                self.set_alive(false);
                metrics::record_forward_failure(&self.address, err.kind());
                tracing::warn!(backend = %self.address, error = %err, "Forward failed");
                Err(err)
            }
        }
    }
}

/// Parse and check a configured backend address.
pub fn parse_address(address: &str) -> Result<Url, BackendError> {
    let url = Url::parse(address).map_err(|source| BackendError::InvalidAddress {
        address: address.to_string(),
        source,
    })?;

    let unsupported = |reason| BackendError::UnsupportedAddress {
        address: address.to_string(),
        reason,
    };
    if url.scheme() != "http" {
        return Err(unsupported("only http:// backends are supported"));
    }
    if url.host_str().is_none() {
        return Err(unsupported("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(unsupported("query and fragment are not allowed"));
    }
    Ok(url)
}
