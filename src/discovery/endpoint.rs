//! Replica endpoint abstraction.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::http::Uri;

/// One resolved replica: an address paired with the configured port.
///
/// Endpoints are recomputed on every dispatch and never shared across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    addr: SocketAddr,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(ip, port),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URI for `path` on this endpoint.
    pub fn uri(&self, path: &str) -> Result<Uri, axum::http::Error> {
        let path = if path.starts_with('/') { path } else { "/" };
        let uri = Uri::builder()
            .scheme("http")
            .authority(self.addr.to_string())
            .path_and_query(path)
            .build()?;
        Ok(uri)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

/// Displays as the bare IP, the form used in failure reports.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr.ip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri() {
        let endpoint = Endpoint::new("10.0.0.1".parse().unwrap(), 6081);
        assert_eq!(endpoint.uri("/update").unwrap().to_string(), "http://10.0.0.1:6081/update");
        assert_eq!(endpoint.uri("").unwrap().to_string(), "http://10.0.0.1:6081/");
    }

    #[test]
    fn test_ipv6_uri() {
        let endpoint = Endpoint::new("::1".parse().unwrap(), 6081);
        assert_eq!(endpoint.uri("/").unwrap().to_string(), "http://[::1]:6081/");
        assert_eq!(endpoint.to_string(), "::1");
    }
}
