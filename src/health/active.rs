//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend
//! - Keep probes of different backends independent of each other

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};

use crate::load_balancer::pool::BackendPool;

/// Shortest tick period; smaller intervals are raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub struct HealthMonitor {
    backends: BackendPool,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(backends: BackendPool, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(
                requested = ?interval,
                using = ?MIN_INTERVAL,
                "Health check interval too short, raising it"
            );
        }
        Self {
            backends,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Probe on every tick until `shutdown` fires. The first round runs
    /// immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            backends = self.backends.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut probes = JoinSet::new();
        let mut in_flight = self.empty_slots();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Reap probes finished since the last round.
                    while probes.try_join_next().is_some() {}
                    self.spawn_probes(&mut probes, &mut in_flight);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        probes.shutdown().await;
    }

    /// Launch one probe per backend without waiting on any of them. A
    /// backend whose previous probe is still running is skipped this round.
    pub fn spawn_probes(&self, probes: &mut JoinSet<bool>, in_flight: &mut [Option<AbortHandle>]) {
        for (slot, backend) in in_flight.iter_mut().zip(self.backends.iter()) {
            if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
                tracing::debug!(backend = %backend.address(), "Previous health probe still running");
                continue;
            }

            let backend = backend.clone();
            *slot = Some(probes.spawn(async move {
                let alive = backend.probe_health().await;
                tracing::debug!(backend = %backend.address(), alive, "Health probe finished");
                alive
            }));
        }
    }

    fn empty_slots(&self) -> Vec<Option<AbortHandle>> {
        (0..self.backends.len()).map(|_| None).collect()
    }

    /// Run a single round to completion and return how many backends are alive.
    pub async fn check_once(&self) -> usize {
        let mut probes = JoinSet::new();
        let mut in_flight = self.empty_slots();
        self.spawn_probes(&mut probes, &mut in_flight);

        let mut alive = 0;
        while let Some(result) = probes.join_next().await {
            match result {
                Ok(true) => alive += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "Health probe task failed"),
            }
        }
        alive
    }
}
