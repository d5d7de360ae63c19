//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → One independent probe task per backend
//!     → Backend::probe_health sets liveness
//!
//! Passive health checks (load_balancer/backend.rs):
//!     Forward times out or fails at the transport level
//!     → Backend marked not alive immediately
//! ```
//!
//! # Design Decisions
//! - Liveness is a single flag per backend; the latest observation wins
//! - A slow backend never delays probing of the others
//! - Probe deadlines are shorter than the tick interval, so probes of one
//!   backend cannot pile up across ticks

pub mod active;
