//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls (forwards, health probes) with a deadline
//! - Keep timeout errors distinct from the call's own errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future cancels the call
//! - Every call to a backend has a deadline

use std::future::Future;
use std::time::Duration;

use tokio::time;

/// Outcome of a bounded call that did not succeed.
#[derive(Debug)]
pub enum Bounded<E> {
    /// The call finished in time but failed.
    Failed(E),
    /// The deadline passed first.
    Elapsed(Duration),
}

/// Run `fut` for at most `limit`.
pub async fn bounded<F, T, E>(limit: Duration, fut: F) -> Result<T, Bounded<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Bounded::Failed(e)),
        Err(_) => Err(Bounded::Elapsed(limit)),
    }
}
