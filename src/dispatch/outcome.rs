//! Per-endpoint outcomes and their aggregation.
//!
//! # Design Decisions
//! - All-or-nothing: one failed endpoint fails the whole dispatch
//! - Failures are reported in collection order, which follows completion
//!   order and is not stable across runs
//! - Only the last attempt's error is kept for an endpoint

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::discovery::{Endpoint, ResolveError};

/// Why a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The replica answered with a status at or above 400.
    #[error("status {}", .0.as_u16())]
    Status(StatusCode),

    /// No complete response within the per-attempt timeout.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Connect, write or read failure.
    #[error("{0}")]
    Transport(String),

    /// The inbound request went away.
    #[error("cancelled")]
    Cancelled,

    /// The outbound request could not be built.
    #[error("invalid request: {0}")]
    Build(#[from] axum::http::Error),

    /// The endpoint's worker task ended without reporting.
    #[error("worker aborted: {0}")]
    Aborted(String),
}

impl AttemptError {
    /// Transport failure rendered with its whole source chain.
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        AttemptError::Transport(message)
    }
}

/// Terminal result of delivering to one endpoint.
#[derive(Debug)]
pub struct EndpointOutcome {
    pub endpoint: Endpoint,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub result: Result<(), AttemptError>,
}

impl EndpointOutcome {
    pub fn success(endpoint: Endpoint, attempts: u32) -> Self {
        Self {
            endpoint,
            attempts,
            result: Ok(()),
        }
    }

    pub fn failure(endpoint: Endpoint, attempts: u32, error: AttemptError) -> Self {
        Self {
            endpoint,
            attempts,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// An endpoint that exhausted its attempts.
#[derive(Debug)]
pub struct EndpointFailure {
    pub endpoint: Endpoint,
    pub attempts: u32,
    pub error: AttemptError,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

/// Why a broadcast did not reach every replica.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed replicas: [{}]", join(.0))]
    Failed(Vec<EndpointFailure>),
}

fn join(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Aggregate of every endpoint outcome for one dispatch.
#[derive(Debug, Default)]
pub struct DispatchResult {
    /// Endpoints that accepted the request.
    pub delivered: usize,
    pub failures: Vec<EndpointFailure>,
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure descriptions in `"<ip>: <error>"` form.
    pub fn failure_messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    /// Number of delivered endpoints, or the list of failures.
    pub fn into_result(self) -> Result<usize, DispatchError> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(DispatchError::Failed(self.failures))
        }
    }
}

/// Reduce per-endpoint outcomes to a single verdict.
pub fn aggregate<I>(outcomes: I) -> DispatchResult
where
    I: IntoIterator<Item = EndpointOutcome>,
{
    let mut result = DispatchResult::default();
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => result.delivered += 1,
            Err(error) => result.failures.push(EndpointFailure {
                endpoint: outcome.endpoint,
                attempts: outcome.attempts,
                error,
            }),
        }
    }
    result
}
