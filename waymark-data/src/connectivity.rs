//! Reachability probe consulted before networked providers are contacted.

use std::{
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use url::Url;
use waymark_core::Connectivity;

/// Default probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

/// Connectivity check that opens a TCP connection to a known host.
///
/// Each call resolves the host afresh and succeeds as soon as one resolved
/// address accepts a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe `host:port` with the default timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    /// Probe the host and port of a provider base URL.
    ///
    /// Returns `None` when the URL does not parse or names no host.
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Option<Self> {
        let url = Url::parse(base_url).ok()?;
        let host = url.host_str()?.to_owned();
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port))
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host being probed.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port being probed.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn addresses(&self) -> Vec<SocketAddr> {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addresses) => addresses.collect(),
            Err(err) => {
                log::debug!("could not resolve {}: {err}", self.host);
                Vec::new()
            }
        }
    }
}

impl Connectivity for TcpProbe {
    fn is_reachable(&self) -> bool {
        let reachable = self
            .addresses()
            .iter()
            .any(|address| TcpStream::connect_timeout(address, self.timeout).is_ok());
        if !reachable {
            log::info!("{}:{} is unreachable; staying offline", self.host, self.port);
        }
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedResponse, CannedServer};
    use rstest::rstest;

    #[rstest]
    #[case("https://photon.komoot.io", "photon.komoot.io", 443)]
    #[case("http://localhost:2322/", "localhost", 2322)]
    #[case("http://overpass-api.de/api", "overpass-api.de", 80)]
    fn derives_host_and_port_from_base_urls(
        #[case] base_url: &str,
        #[case] host: &str,
        #[case] port: u16,
    ) {
        let probe = TcpProbe::for_base_url(base_url).expect("URL has a host");
        assert_eq!((probe.host(), probe.port()), (host, port));
    }

    #[rstest]
    fn rejects_urls_without_hosts() {
        assert_eq!(TcpProbe::for_base_url("not a url"), None);
    }

    #[rstest]
    fn listening_hosts_are_reachable() {
        let server = CannedServer::start(vec![CannedResponse::status(204)]).expect("server");
        let address = server.address();
        let probe = TcpProbe::new(address.ip().to_string(), address.port());
        assert!(probe.is_reachable());
    }

    #[rstest]
    fn closed_ports_are_unreachable() {
        let address = CannedServer::unused_address().expect("reserve port");
        let probe = TcpProbe::new(address.ip().to_string(), address.port())
            .with_timeout(Duration::from_millis(200));
        assert!(!probe.is_reachable());
    }
}
