//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::pool::BackendPool;
use crate::load_balancer::upstream::SharedUpstream;

/// Round-robin selector that skips dead backends.
/// Stores a shared cursor; every call draws a distinct start offset.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next start offset and advance the cursor.
    pub fn next_offset(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Pick the first alive backend starting from a fresh cursor draw.
    ///
    /// Scans at most `pool.len()` candidates, so an all-dead pool yields
    /// `None` instead of spinning.
    pub fn next_server(&self, pool: &BackendPool) -> Option<SharedUpstream> {
        if pool.is_empty() {
            return None;
        }

        let start = self.next_offset();
        let len = pool.len();

        (0..len)
            .filter_map(|i| pool.get(start.wrapping_add(i) % len))
            .find(|backend| backend.is_alive())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::load_balancer::testing::pool;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends = pool(&[("b1", true), ("b2", true)]);

        let s1 = lb.next_server(&backends).unwrap();
        assert_eq!(s1.address(), "b1");

        let s2 = lb.next_server(&backends).unwrap();
        assert_eq!(s2.address(), "b2");

        let s3 = lb.next_server(&backends).unwrap();
        assert_eq!(s3.address(), "b1");
    }

    #[test]
    fn test_each_backend_once_per_cycle() {
        let lb = RoundRobin::new();
        let backends = pool(&[("a", true), ("b", true), ("c", true), ("d", true)]);
        // Start mid-rotation.
        lb.next_server(&backends);

        let picked: Vec<String> = (0..4)
            .map(|_| lb.next_server(&backends).unwrap().address().to_string())
            .collect();
        assert_eq!(picked, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_skips_dead_from_any_start() {
        let lb = RoundRobin::new();
        let backends = pool(&[("a", false), ("b", true), ("c", false)]);
        for _ in 0..9 {
            assert_eq!(lb.next_server(&backends).unwrap().address(), "b");
        }
    }

    #[test]
    fn test_all_dead_returns_none() {
        let lb = RoundRobin::new();
        let backends = pool(&[("a", false), ("b", false)]);
        for _ in 0..4 {
            assert!(lb.next_server(&backends).is_none());
        }
    }

    #[test]
    fn test_empty_returns_none() {
        let lb = RoundRobin::new();
        assert!(lb.next_server(&BackendPool::default()).is_none());
        // No draw is consumed for an empty pool.
        assert_eq!(lb.next_offset(), 0);
    }

    #[test]
    fn test_revived_backend_is_selected_again() {
        let lb = RoundRobin::new();
        let backends = pool(&[("a", false), ("b", true)]);
        assert_eq!(lb.next_server(&backends).unwrap().address(), "b");

        backends.get(0).unwrap().set_alive(true);
        let picked: HashSet<String> = (0..2)
            .map(|_| lb.next_server(&backends).unwrap().address().to_string())
            .collect();
        assert!(picked.contains("a"));
    }

    #[test]
    fn test_offset_wraps_without_panicking() {
        let lb = RoundRobin {
            counter: AtomicUsize::new(usize::MAX),
        };
        let backends = pool(&[("a", true), ("b", true), ("c", true)]);
        assert!(lb.next_server(&backends).is_some());
        assert!(lb.next_server(&backends).is_some());
    }

    #[test]
    fn test_concurrent_draws_are_distinct() {
        let lb = Arc::new(RoundRobin::new());
        let threads = 8;
        let per_thread = 500;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let lb = lb.clone();
                std::thread::spawn(move || {
                    (0..per_thread).map(|_| lb.next_offset()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for offset in handle.join().unwrap() {
                assert!(seen.insert(offset), "offset {} drawn twice", offset);
            }
        }
        assert_eq!(seen.len(), threads * per_thread);
    }

    #[test]
    fn test_concurrent_selection_only_returns_alive() {
        let lb = Arc::new(RoundRobin::new());
        let backends = pool(&[
            ("a", true),
            ("b", false),
            ("c", true),
            ("d", false),
            ("e", true),
        ]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lb = lb.clone();
                let backends = backends.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let picked = lb.next_server(&backends).unwrap();
                        assert!(picked.is_alive());
                        assert!(["a", "c", "e"].contains(&picked.address()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
