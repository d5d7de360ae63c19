//! Retry policy.
//!
//! # Responsibilities
//! - Bound the number of dispatch attempts per request
//! - Provide the (optional) delay between attempts
//!
//! # Design Decisions
//! - An attempt that finds no alive backend counts against the budget
//! - A failed forward counts too; the backend is already demoted by then
//! - Default delay is zero: liveness may flip between attempts because of
//!   other requests' failures, so an immediate re-scan is worthwhile

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// How many times, and how patiently, a request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never zero.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Policy with `max_attempts` immediate attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay to wait before attempt `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt.saturating_sub(1), self.base_delay, self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}
