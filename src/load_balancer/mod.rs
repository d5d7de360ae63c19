//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → dispatcher.rs (buffer body, bounded retry loop)
//!     → round_robin.rs (atomic cursor draw, scan for a live backend)
//!     → pool.rs (fixed, ordered registry of backends)
//!     → backend.rs (forward via the shared HTTP client)
//!     → Response, or 503 once attempts are exhausted
//! ```
//!
//! # Design Decisions
//! - Registry membership is immutable after construction; no locking needed
//! - Liveness is the only mutable backend state, held in an `AtomicBool`
//! - The cursor is a lock-free `fetch_add`, so concurrent dispatches fan out
//! - Failed forwards demote the backend immediately (passive health)

pub mod backend;
pub mod dispatcher;
pub mod errors;
pub mod pool;
pub mod round_robin;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::HttpBackend;
pub use dispatcher::Dispatcher;
pub use errors::{BackendError, DispatchError, ForwardError};
pub use pool::BackendPool;
pub use round_robin::RoundRobin;
pub use upstream::{SharedUpstream, Upstream};
