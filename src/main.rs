//! Replica broadcast proxy (v1)
//!
//! Fans every inbound request out to all replicas behind `BACKEND_HOST`.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               BROADCAST PROXY                │
//!   Client request        │  ┌────────┐   ┌───────────┐   ┌──────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│ discovery │──▶│ dispatch │──┼──▶ replica 1
//!                         │  │ server │   │ (resolve) │   │ (fan-out)│──┼──▶ replica 2
//!                         │  └────────┘   └───────────┘   └────┬─────┘──┼──▶ replica N
//!                         │       ▲                            │        │
//!   200 OK / 500 failures │       │        aggregate           │        │
//!   ◀─────────────────────┼───────┴────────────────────────────┘        │
//!                         │                                              │
//!                         │  /healthz → health (first replica < 500)     │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use broadcast_proxy::config;
use broadcast_proxy::lifecycle;
use broadcast_proxy::observability::logging;

#[tokio::main]
async fn main() {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("broadcast-proxy: configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("broadcast-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = lifecycle::start(config).await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
