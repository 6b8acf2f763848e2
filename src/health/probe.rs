//! Liveness probing.
//!
//! # Responsibilities
//! - Resolve the replica set
//! - Probe replicas one at a time until one answers acceptably
//!
//! # Design Decisions
//! - Fixed 1s timeout per probe, independent of the dispatch timeout
//! - Status < 500 counts as alive: 4xx means the replica is up
//! - Sequential, first success wins

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use tokio::time;

use crate::discovery::{Endpoint, Resolve, ResolveError};
use crate::dispatch::{drain, http_client, DispatchPolicy, HttpClient};
use crate::observability::metrics;

/// Timeout for a single probe request.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of one liveness check.
#[derive(Debug)]
pub enum Liveness {
    /// This endpoint answered below 500.
    Healthy(Endpoint),
    /// Replicas resolved but none answered acceptably.
    Unreachable,
    /// The replica set could not be resolved.
    Unresolved(ResolveError),
}

impl Liveness {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Liveness::Healthy(_))
    }
}

#[derive(Clone)]
pub struct Prober {
    resolver: Arc<dyn Resolve>,
    client: HttpClient,
    timeout: Duration,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("resolver", &self.resolver)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Prober {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self::with_client(resolver, http_client())
    }

    pub fn with_client(resolver: Arc<dyn Resolve>, client: HttpClient) -> Self {
        Self {
            resolver,
            client,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Check whether at least one replica behind `host` is alive.
    pub async fn probe(&self, host: &str, policy: &DispatchPolicy) -> Liveness {
        let endpoints = match self.resolver.resolve(host, policy.port).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Health check failed: resolution");
                metrics::record_probe(false);
                return Liveness::Unresolved(e);
            }
        };

        for endpoint in endpoints {
            if self.check(&endpoint).await {
                metrics::record_probe(true);
                return Liveness::Healthy(endpoint);
            }
        }

        metrics::record_probe(false);
        Liveness::Unreachable
    }

    async fn check(&self, endpoint: &Endpoint) -> bool {
        let request = match endpoint.uri("/").and_then(|uri| {
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::USER_AGENT, "broadcast-proxy-health-check")
                .body(Body::empty())
        }) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to build health check request: {}", e);
                return false;
            }
        };

        let exchange = async {
            let response = self.client.request(request).await?;
            Ok::<_, hyper_util::client::legacy::Error>(drain(response).await)
        };

        match time::timeout(self.timeout, exchange).await {
            Ok(Ok(status)) if status.as_u16() < 500 => true,
            Ok(Ok(status)) => {
                tracing::warn!(endpoint = %endpoint, status = %status, "Health check failed: server error");
                false
            }
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(endpoint = %endpoint, "Health check failed: timeout");
                false
            }
        }
    }
}
