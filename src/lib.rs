//! Replica broadcast proxy library.
//!
//! Receives one HTTP request and replicates it to every replica behind a
//! hostname, succeeding only when every replica accepts it.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::BroadcastConfig;
pub use dispatch::{Broadcaster, DispatchPolicy, DispatchRequest};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
