//! Fan-out dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (body drained once)
//!     → request.rs (DispatchRequest snapshot)
//!     → discovery (endpoints for BACKEND_HOST)
//!     → replicator.rs (one worker per endpoint, bounded retries + timeout)
//!     → outcome.rs (aggregate: all-or-nothing)
//!     → broadcaster.rs returns Ok(delivered) or DispatchError
//! ```
//!
//! # Design Decisions
//! - No state survives a dispatch; endpoints are resolved per call
//! - Policy is passed in explicitly, never read from the environment
//! - Partial success is a failure

pub mod broadcaster;
pub mod outcome;
pub mod replicator;
pub mod request;

use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

pub use broadcaster::Broadcaster;
pub use outcome::{aggregate, AttemptError, DispatchError, DispatchResult, EndpointFailure, EndpointOutcome};
pub use replicator::Replicator;
pub use request::DispatchRequest;

/// Outbound HTTP client shared by every worker.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the pooled outbound client.
pub fn http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Read a replica response to the end and return its status.
///
/// The body is discarded so the connection can return to the pool. A body read
/// error does not change the status.
pub(crate) async fn drain(response: hyper::Response<Incoming>) -> StatusCode {
    let status = response.status();
    if let Err(e) = response.into_body().collect().await {
        tracing::debug!(status = %status, error = %e, "Response body read failed");
    }
    status
}

/// Delivery policy for one dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Port used on every endpoint.
    pub port: u16,
    /// Additional attempts after the first.
    pub retries: u32,
    /// Bound on each attempt.
    pub timeout: Duration,
}

impl DispatchPolicy {
    /// Total attempts allowed per endpoint.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            port: 6081,
            retries: 2,
            timeout: Duration::from_secs(3),
        }
    }
}
