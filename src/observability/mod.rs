//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Structured fields (`backend`, `attempt`, `request_id`) instead of formatted strings
//! - Request ID flows through every span of a request
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
