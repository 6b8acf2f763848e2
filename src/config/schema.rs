//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the broadcaster.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchPolicy;

/// Root configuration for the broadcaster.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Replica set to broadcast to.
    pub backend: BackendConfig,

    /// Per-replica delivery policy.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BroadcastConfig {
    /// Policy handed to the replicator and prober for one call.
    pub fn policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            port: self.backend.port,
            retries: self.dispatch.retries,
            timeout: Duration::from_millis(self.dispatch.timeout_ms),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest inbound body that will be buffered for replication.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Backend replica set.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Hostname resolved into replica addresses on every dispatch.
    /// Required; an empty host fails validation.
    pub host: String,

    /// Port used for every resolved replica.
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 6081,
        }
    }
}

/// Retry and timeout policy for each replica.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Additional attempts per replica after the first.
    pub retries: u32,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            timeout_ms: 3000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Human-readable or JSON lines.
    pub log_format: LogFormat,

    /// Prometheus exporter bind address. Exporter is off when unset.
    pub metrics_address: Option<String>,
}

impl ObservabilityConfig {
    /// The exporter address, when one is set and parses.
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        self.metrics_address.as_deref()?.parse().ok()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "broadcast_proxy=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}
