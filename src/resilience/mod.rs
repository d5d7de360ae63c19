//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (deadline on response headers / health probes)
//!     → On failure: backend demoted, retries.rs decides whether another attempt runs
//!     → backoff.rs (optional delay between attempts, zero by default)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every call to a backend has a deadline
//! - Retries re-run selection, so a retry may land on a different backend
//! - Only transport failures and timeouts are retried, never upstream statuses

pub mod backoff;
pub mod retries;
pub mod timeouts;
