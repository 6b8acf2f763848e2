//! Mapping of broadcast and health results to HTTP responses.
//!
//! # Design Decisions
//! - Plain-text bodies terminated by a newline
//! - Any replica failure, resolution failure included, is a 500
//! - An unhealthy replica set is a 503

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::dispatch::DispatchError;
use crate::health::Liveness;

/// Response for a finished broadcast.
pub fn broadcast_response(result: &Result<usize, DispatchError>) -> Response {
    match result {
        Ok(_) => (StatusCode::OK, "OK\n").into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response(),
    }
}

/// Response for `/healthz`.
pub fn health_response(liveness: &Liveness) -> Response {
    match liveness {
        Liveness::Healthy(_) => (StatusCode::OK, "ok\n").into_response(),
        Liveness::Unreachable => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy\n").into_response(),
        Liveness::Unresolved(e) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}\n")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Endpoint, ResolveError};
    use crate::dispatch::{AttemptError, EndpointFailure};

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_ok() {
        let response = broadcast_response(&Ok(2));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK\n");
    }

    #[tokio::test]
    async fn test_broadcast_failed() {
        let failure = EndpointFailure {
            endpoint: Endpoint::new("10.0.0.2".parse().unwrap(), 6081),
            attempts: 3,
            error: AttemptError::Status(StatusCode::SERVICE_UNAVAILABLE),
        };
        let response = broadcast_response(&Err(DispatchError::Failed(vec![failure])));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "failed replicas: [10.0.0.2: status 503]\n");
    }

    #[tokio::test]
    async fn test_health_unresolved() {
        let liveness = Liveness::Unresolved(ResolveError::NoAddresses {
            host: "replicas".into(),
        });
        let response = health_response(&liveness);

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_text(response).await,
            "unhealthy: no backend IPs resolved for replicas\n"
        );
    }

    #[tokio::test]
    async fn test_health_states() {
        let endpoint = Endpoint::new("10.0.0.1".parse().unwrap(), 6081);
        let healthy = health_response(&Liveness::Healthy(endpoint));
        assert_eq!(healthy.status(), StatusCode::OK);
        assert_eq!(body_text(healthy).await, "ok\n");

        let unreachable = health_response(&Liveness::Unreachable);
        assert_eq!(unreachable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(unreachable).await, "unhealthy\n");
    }
}
