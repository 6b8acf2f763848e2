//! One full fan-out: resolve, replicate, aggregate.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::discovery::Resolve;
use crate::dispatch::outcome::{aggregate, DispatchError};
use crate::dispatch::replicator::Replicator;
use crate::dispatch::request::DispatchRequest;
use crate::dispatch::DispatchPolicy;

/// Resolves the replica set and broadcasts requests to it.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    resolver: Arc<dyn Resolve>,
    replicator: Replicator,
}

impl Broadcaster {
    pub fn new(resolver: Arc<dyn Resolve>, replicator: Replicator) -> Self {
        Self {
            resolver,
            replicator,
        }
    }

    /// Broadcast `request` to every replica behind `host`.
    ///
    /// Succeeds with the number of replicas reached only when every replica
    /// accepted the request.
    pub async fn broadcast(
        &self,
        host: &str,
        policy: &DispatchPolicy,
        request: DispatchRequest,
        cancel: &CancellationToken,
    ) -> Result<usize, DispatchError> {
        let endpoints = self.resolver.resolve(host, policy.port).await?;
        let start = Instant::now();

        let outcomes = self
            .replicator
            .dispatch(Arc::new(request), &endpoints, policy, cancel)
            .await;
        let result = aggregate(outcomes);

        tracing::info!(
            host = %host,
            replicas = endpoints.len(),
            delivered = result.delivered,
            failed = result.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Broadcast finished"
        );

        result.into_result()
    }
}
