//! Round-robin HTTP load balancer.
//!
//! Spreads inbound requests across a fixed set of upstream servers,
//! skipping the ones that failed their last health probe or forward.

pub mod config;
pub mod http;

pub mod health;
pub mod load_balancer;

pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::Dispatcher;
