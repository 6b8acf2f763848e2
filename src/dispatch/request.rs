//! Buffered request snapshot.
//!
//! # Responsibilities
//! - Hold method, path, headers and body read once from the inbound stream
//! - Build a fresh outbound request per attempt
//!
//! # Design Decisions
//! - Body is `Bytes`: every attempt shares the same buffer, never re-read
//! - Headers are cloned per attempt; the client may mutate its copy
//! - Hop-by-hop headers, `host` and `content-length` are dropped; the client
//!   fills in `host` for the endpoint and the length of the buffered body
//! - Only the path is forwarded; the query string is not

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, HeaderName, Method, Request};

use crate::discovery::Endpoint;

const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("proxy-connection"),
];

/// Immutable snapshot of one inbound request, replicated to every endpoint.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl DispatchRequest {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            headers: forwardable(headers),
            body,
        }
    }

    /// Snapshot from the head of an inbound request and its drained body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.path(),
            parts.headers.clone(),
            body,
        )
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Outbound request for one attempt against `endpoint`.
    pub fn to_http(&self, endpoint: &Endpoint) -> Result<Request<Body>, axum::http::Error> {
        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(endpoint.uri(&self.path)?)
            .body(Body::from(self.body.clone()))?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }
}

fn forwardable(mut headers: HeaderMap) -> HeaderMap {
    // Headers listed in `Connection` are hop-by-hop too.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}
