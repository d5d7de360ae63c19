//! Demo upstream for trying the balancer locally.
//!
//! ```text
//! mock-backend --port 8001 &
//! mock-backend --port 8002 --delay-ms 5000 &
//! rr-proxy --backend http://127.0.0.1:8001 --backend http://127.0.0.1:8002
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mock-backend", about = "Tiny HTTP upstream for load balancer demos")]
struct Cli {
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Sleep this long before answering `/`, to play a slow backend
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[derive(Clone)]
struct Greeting {
    port: u16,
    delay: Duration,
}

async fn hello(State(greeting): State<Greeting>) -> String {
    if !greeting.delay.is_zero() {
        tokio::time::sleep(greeting.delay).await;
    }
    format!("Hello from backend on port {}", greeting.port)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_backend=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let state = Greeting {
        port: cli.port,
        delay: Duration::from_millis(cli.delay_ms),
    };

    let app = Router::new()
        .route("/", get(hello))
        .route("/health", get(|| async { "OK" }))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, delay_ms = cli.delay_ms, "Mock backend listening");

    axum::serve(listener, app).await?;
    Ok(())
}
