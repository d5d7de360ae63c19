//! In-memory upstream used by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response, StatusCode};

use crate::load_balancer::errors::ForwardError;
use crate::load_balancer::pool::BackendPool;
use crate::load_balancer::upstream::{SharedUpstream, Upstream};

/// How a fake upstream answers forwards.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Respond(StatusCode),
    /// Fail the forward with a timeout and demote.
    Fail,
}

#[derive(Debug)]
pub struct FakeUpstream {
    name: String,
    alive: AtomicBool,
    healthy: AtomicBool,
    behavior: Behavior,
    pub forwards: AtomicUsize,
    pub probes: AtomicUsize,
    pub bodies: Mutex<Vec<Bytes>>,
}

impl FakeUpstream {
    pub fn new(name: &str, alive: bool, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            alive: AtomicBool::new(alive),
            healthy: AtomicBool::new(alive),
            behavior,
            forwards: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn alive(name: &str) -> Arc<Self> {
        Self::new(name, true, Behavior::Respond(StatusCode::OK))
    }

    pub fn dead(name: &str) -> Arc<Self> {
        Self::new(name, false, Behavior::Respond(StatusCode::OK))
    }

    /// What the next probe reports.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn forward_count(&self) -> usize {
        self.forwards.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    fn address(&self) -> &str {
        &self.name
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    async fn probe_health(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let healthy = self.healthy.load(Ordering::SeqCst);
        self.set_alive(healthy);
        healthy
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        self.forwards.fetch_add(1, Ordering::SeqCst);
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        self.bodies.lock().unwrap().push(body);

        match self.behavior {
            Behavior::Respond(status) => Ok(Response::builder()
                .status(status)
                .header("x-served-by", self.name.as_str())
                .body(Body::from(self.name.clone()))
                .unwrap()),
            Behavior::Fail => {
                self.set_alive(false);
                Err(ForwardError::Timeout {
                    address: self.name.clone(),
                    after: Duration::from_millis(1),
                })
            }
        }
    }
}

/// Build a pool from fakes, preserving order.
pub fn pool_of(fakes: &[Arc<FakeUpstream>]) -> BackendPool {
    BackendPool::new(
        fakes
            .iter()
            .map(|f| f.clone() as SharedUpstream)
            .collect(),
    )
}

/// Shorthand: a pool of alive/dead fakes named by `backends`.
pub fn pool(backends: &[(&str, bool)]) -> BackendPool {
    let fakes: Vec<_> = backends
        .iter()
        .map(|(name, alive)| {
            if *alive {
                FakeUpstream::alive(name)
            } else {
                FakeUpstream::dead(name)
            }
        })
        .collect();
    pool_of(&fakes)
}
