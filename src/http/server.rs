//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: `/healthz` plus a catch-all broadcast handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Buffer each inbound body once and hand it to the broadcaster
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::BroadcastConfig;
use crate::discovery::{DnsResolver, Resolve};
use crate::dispatch::{http_client, Broadcaster, DispatchRequest, Replicator};
use crate::health::Prober;
use crate::http::request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::http::response::{broadcast_response, health_response};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BroadcastConfig>,
    pub broadcaster: Broadcaster,
    pub prober: Prober,
}

/// HTTP server for the broadcaster.
pub struct HttpServer {
    router: Router,
    config: Arc<BroadcastConfig>,
}

impl HttpServer {
    /// Create a server resolving replicas through the system resolver.
    pub fn new(config: BroadcastConfig) -> Self {
        Self::with_resolver(config, Arc::new(DnsResolver))
    }

    /// Create a server with a specific replica resolver.
    pub fn with_resolver(config: BroadcastConfig, resolver: Arc<dyn Resolve>) -> Self {
        let config = Arc::new(config);
        let client = http_client();

        let state = AppState {
            config: Arc::clone(&config),
            broadcaster: Broadcaster::new(Arc::clone(&resolver), Replicator::new(client.clone())),
            prober: Prober::with_client(resolver, client),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BroadcastConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", any(health_handler))
            .fallback(broadcast_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes)),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }
}

fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.uri().path()
    )
}

/// Replicates any request to every backend replica.
async fn broadcast_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = if exceeds_limit(&e) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(error = %e, status = %status, "Failed to read request body");
            metrics::record_request(&method, status.as_u16(), start_time);
            return (status, format!("failed to read body: {e}\n")).into_response();
        }
    };

    let request = DispatchRequest::from_parts(&parts, body);

    // Cancels in-flight attempts if the client goes away and this future is dropped.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let policy = state.config.policy();
    let result = state
        .broadcaster
        .broadcast(&state.config.backend.host, &policy, request, &cancel)
        .await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Broadcast error");
    }

    let response = broadcast_response(&result);
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

/// Reports whether at least one replica is alive.
async fn health_handler(State(state): State<AppState>) -> Response {
    let liveness = state
        .prober
        .probe(&state.config.backend.host, &state.config.policy())
        .await;
    health_response(&liveness)
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
