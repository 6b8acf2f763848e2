use axum::{body::Bytes, http::Method, http::Uri, Router};
use std::net::SocketAddr;

/// A stand-in cache replica: logs whatever it receives and answers 200.
///
/// Run two of them on different loopback IPs with the same port to try the
/// proxy locally, e.g. `cargo run --example mock_replica -- 127.0.0.2:6081`.
#[tokio::main]
async fn main() {
    let addr: SocketAddr = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6081)));

    let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| async move {
        println!("{addr} <- {method} {uri} ({} bytes)", body.len());
        "replica ok\n"
    });

    println!("Mock replica is listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
