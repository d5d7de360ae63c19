//! Backend registry.
//!
//! # Responsibilities
//! - Hold the ordered, fixed list of backends built at startup
//! - Provide the traversal order used by round-robin selection
//! - Hand out the full list for health checking

use std::sync::Arc;
use std::time::Duration;

use crate::config::BalancerConfig;
use crate::load_balancer::backend::{build_client, BackendSettings, HttpBackend};
use crate::load_balancer::errors::BackendError;
use crate::load_balancer::upstream::SharedUpstream;

/// Ordered, immutable set of backends.
///
/// Cloning is cheap and shares the same backends, so liveness updates made
/// through one clone are visible through all of them.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Arc<[SharedUpstream]>,
}

impl BackendPool {
    /// Build a pool from already constructed backends, keeping their order.
    pub fn new(backends: Vec<SharedUpstream>) -> Self {
        Self {
            backends: backends.into(),
        }
    }

    /// Build HTTP backends for every configured address.
    ///
    /// Fails on the first address that cannot be used.
    pub fn from_addresses<S: AsRef<str>>(
        addresses: &[S],
        settings: BackendSettings,
        connect_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = build_client(connect_timeout);
        let backends = addresses
            .iter()
            .map(|address| {
                HttpBackend::new(address.as_ref(), client.clone(), settings.clone())
                    .map(|b| Arc::new(b) as SharedUpstream)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for backend in backends.iter() {
            tracing::debug!(backend = %backend.address(), "Backend registered");
        }
        Ok(Self::new(backends))
    }

    pub fn from_config(config: &BalancerConfig) -> Result<Self, BackendError> {
        Self::from_addresses(
            &config.backends,
            BackendSettings::from_config(config),
            Duration::from_secs(config.timeouts.connect_secs),
        )
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SharedUpstream> {
        self.backends.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedUpstream> {
        self.backends.iter()
    }

    /// Number of backends currently marked alive.
    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }
}

impl Default for BackendPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_addresses_keeps_order() {
        let pool = BackendPool::from_addresses(
            &["http://127.0.0.1:9001", "http://127.0.0.1:9002", "http://127.0.0.1:9003"],
            BackendSettings::default(),
            Duration::from_secs(1),
        )
        .unwrap();

        let addrs: Vec<&str> = pool.iter().map(|b| b.address()).collect();
        assert_eq!(
            addrs,
            vec!["http://127.0.0.1:9001", "http://127.0.0.1:9002", "http://127.0.0.1:9003"]
        );
        assert_eq!(pool.alive_count(), 3);
    }

    #[test]
    fn test_from_addresses_rejects_bad_address() {
        let res = BackendPool::from_addresses(
            &["http://127.0.0.1:9001", "::nope::"],
            BackendSettings::default(),
            Duration::from_secs(1),
        );
        assert!(matches!(res, Err(BackendError::InvalidAddress { .. })));
    }

    #[test]
    fn test_clones_share_liveness() {
        let pool = BackendPool::from_addresses(
            &["http://127.0.0.1:9001"],
            BackendSettings::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        let other = pool.clone();

        pool.get(0).unwrap().set_alive(false);
        assert!(!other.get(0).unwrap().is_alive());
        assert_eq!(other.alive_count(), 0);
    }

    #[test]
    fn test_empty_pool() {
        let pool = BackendPool::default();
        assert!(pool.is_empty());
        assert!(pool.get(0).is_none());
    }
}
