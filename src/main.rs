//! rr-proxy
//!
//! A round-robin reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ dispatcher ──▶ round robin ──▶ backend ──▶ Upstream
//!                     (request id,    (buffer body,   (atomic         (shared
//!                      tracing,        retry loop)     cursor,         client)
//!                      timeout)                        skip dead)
//!
//!     health monitor ──── probes GET /health on every backend, flips liveness
//! ```

use std::path::PathBuf;

use clap::Parser;

use rr_proxy::config::{load_config, validate_config, BalancerConfig, ConfigError};
use rr_proxy::lifecycle;
use rr_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "rr-proxy", version, about = "Round-robin HTTP load balancer")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port, overrides the file
    #[arg(short, long)]
    port: Option<String>,

    /// Backend base URL; repeat for several. Replaces the file's list.
    #[arg(short, long = "backend")]
    backends: Vec<String>,

    /// Seconds between health probe rounds
    #[arg(long)]
    health_interval: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(secs) = self.health_interval {
            config.health_check.interval_secs = secs;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = %config.listener.port,
        backends = ?config.backends,
        health_interval_secs = config.health_check.interval_secs,
        "rr-proxy starting"
    );

    if config.backends.is_empty() {
        tracing::warn!("No backends configured; every request will get 503");
    }

    lifecycle::run(config).await?;
    Ok(())
}
