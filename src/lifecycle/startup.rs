//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when configured
//! - Bind the listener and hand it to the HTTP server
//! - Wire OS signals to graceful shutdown

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::BroadcastConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the broadcaster until a shutdown signal arrives.
pub async fn start(config: BroadcastConfig) -> Result<(), StartupError> {
    // Validation has already rejected an unparsable exporter address.
    if let Some(addr) = config.observability.metrics_socket_addr() {
        metrics::init_metrics(addr)?;
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let policy = config.policy();
    tracing::info!(
        address = %address,
        backend_host = %config.backend.host,
        backend_port = policy.port,
        retries = policy.retries,
        timeout = ?policy.timeout,
        "Listening for broadcasts"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(config)
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
