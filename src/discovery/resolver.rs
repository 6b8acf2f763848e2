//! Replica resolution.
//!
//! # Responsibilities
//! - Turn the backend hostname into the current replica addresses
//! - De-duplicate addresses and pair them with the configured port
//! - Treat an empty answer as a failure
//!
//! # Design Decisions
//! - No caching and no TTL tracking: every call performs a fresh lookup
//! - Lookup order is preserved; the first occurrence of an address wins

use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::discovery::endpoint::Endpoint;

/// Errors from turning a host into endpoints.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The name lookup itself failed.
    #[error("lookup {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// The lookup succeeded but produced no addresses.
    #[error("no backend IPs resolved for {host}")]
    NoAddresses { host: String },
}

/// Source of replica addresses for a host.
#[async_trait]
pub trait Resolve: Send + Sync + std::fmt::Debug {
    /// Raw addresses currently published for `host`, possibly with duplicates.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;

    /// Resolve `host` into the de-duplicated endpoint set on `port`.
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<Endpoint>, ResolveError> {
        let addrs = self.lookup(host).await?;

        let mut seen = HashSet::with_capacity(addrs.len());
        let endpoints: Vec<Endpoint> = addrs
            .into_iter()
            .filter(|ip| seen.insert(*ip))
            .map(|ip| Endpoint::new(ip, port))
            .collect();

        if endpoints.is_empty() {
            return Err(ResolveError::NoAddresses {
                host: host.to_string(),
            });
        }

        tracing::debug!(host = %host, count = endpoints.len(), "Resolved replicas");
        Ok(endpoints)
    }
}

/// Resolver backed by the system's name service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsResolver;

#[async_trait]
impl Resolve for DnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        // The port is required by the API and discarded.
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|source| ResolveError::Lookup {
                host: host.to_string(),
                source,
            })?;

        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolver answering from a fixed address list, whatever the host.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    addrs: Vec<IpAddr>,
}

impl StaticResolver {
    pub fn new(addrs: Vec<IpAddr>) -> Self {
        Self { addrs }
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        Ok(self.addrs.clone())
    }
}
