//! Concurrent request replication.
//!
//! # Responsibilities
//! - Spawn one worker per endpoint
//! - Run each worker's bounded attempt loop under the per-attempt timeout
//! - Collect exactly one outcome per endpoint
//!
//! # Data Flow
//! ```text
//! DispatchRequest + [Endpoint] + DispatchPolicy + CancellationToken
//!     → JoinSet: deliver() per endpoint
//!         → attempt() × (retries + 1) at most
//!     → join_next_with_id() until empty
//!     → Vec<EndpointOutcome>
//! ```
//!
//! # Design Decisions
//! - Attempts succeed on status < 400; every other result is retried
//! - No delay between attempts
//! - Response bodies are drained and dropped so connections can be reused
//! - Dropping the dispatch future aborts every worker (JoinSet drop)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::discovery::Endpoint;
use crate::dispatch::outcome::{AttemptError, EndpointOutcome};
use crate::dispatch::request::DispatchRequest;
use crate::dispatch::{drain, http_client, DispatchPolicy, HttpClient};
use crate::observability::metrics;

/// Fans a buffered request out to a fixed set of endpoints.
#[derive(Clone)]
pub struct Replicator {
    client: HttpClient,
}

impl std::fmt::Debug for Replicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replicator").finish_non_exhaustive()
    }
}

impl Default for Replicator {
    fn default() -> Self {
        Self::new(http_client())
    }
}

impl Replicator {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Deliver `request` to every endpoint and wait for all of them.
    ///
    /// Returns one outcome per endpoint, in completion order.
    pub async fn dispatch(
        &self,
        request: Arc<DispatchRequest>,
        endpoints: &[Endpoint],
        policy: &DispatchPolicy,
        cancel: &CancellationToken,
    ) -> Vec<EndpointOutcome> {
        let mut workers = JoinSet::new();
        let mut owners = HashMap::with_capacity(endpoints.len());

        for &endpoint in endpoints {
            let client = self.client.clone();
            let request = Arc::clone(&request);
            let policy = *policy;
            let cancel = cancel.clone();
            let span = tracing::debug_span!("replica", endpoint = %endpoint.addr());

            let handle = workers.spawn(
                async move { deliver(&client, &request, endpoint, &policy, &cancel).await }
                    .instrument(span),
            );
            owners.insert(handle.id(), endpoint);
        }

        let mut outcomes = Vec::with_capacity(endpoints.len());
        while let Some(joined) = workers.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    owners.remove(&id);
                    outcomes.push(outcome);
                }
                Err(err) => {
                    if let Some(endpoint) = owners.remove(&err.id()) {
                        tracing::error!(endpoint = %endpoint, error = %err, "Replica worker aborted");
                        outcomes.push(EndpointOutcome::failure(
                            endpoint,
                            0,
                            AttemptError::Aborted(err.to_string()),
                        ));
                    }
                }
            }
        }

        outcomes
    }
}

/// Attempt loop for one endpoint.
async fn deliver(
    client: &HttpClient,
    request: &DispatchRequest,
    endpoint: Endpoint,
    policy: &DispatchPolicy,
    cancel: &CancellationToken,
) -> EndpointOutcome {
    let max_attempts = policy.max_attempts();
    let mut attempts = 0;
    let mut last_error = AttemptError::Cancelled;

    while attempts < max_attempts {
        attempts += 1;

        match attempt(client, request, &endpoint, policy.timeout, cancel).await {
            Ok(status) => {
                metrics::record_attempt(true);
                tracing::debug!(attempt = attempts, status = %status, "Delivered");
                return EndpointOutcome::success(endpoint, attempts);
            }
            Err(err) => {
                metrics::record_attempt(false);
                tracing::warn!(attempt = attempts, max_attempts, error = %err, "Attempt failed");
                last_error = err;
            }
        }

        if cancel.is_cancelled() {
            break;
        }
    }

    metrics::record_endpoint_failure();
    EndpointOutcome::failure(endpoint, attempts, last_error)
}

/// One delivery try, bounded by `timeout` and the cancellation token.
async fn attempt(
    client: &HttpClient,
    request: &DispatchRequest,
    endpoint: &Endpoint,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<StatusCode, AttemptError> {
    let outbound = request.to_http(endpoint)?;

    let exchange = async {
        let response = client
            .request(outbound)
            .await
            .map_err(|e| AttemptError::transport(&e))?;
        let status = drain(response).await;

        if status.as_u16() < 400 {
            Ok(status)
        } else {
            Err(AttemptError::Status(status))
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AttemptError::Cancelled),
        result = tokio::time::timeout(timeout, exchange) => {
            result.unwrap_or(Err(AttemptError::Timeout(timeout)))
        }
    }
}
