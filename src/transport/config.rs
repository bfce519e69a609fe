//! Transport configuration with sensible defaults.

// Layer 1: Standard library
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default listen address for the HTTP transport's server side.
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

/// Default listen port.
pub const DEFAULT_BIND_PORT: u16 = 7737;

/// Default per-RPC client timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for an [`super::HttpTransport`].
///
/// Mirrors [`crate::worker::WorkerPoolConfig`]'s plain-struct-with-defaults
/// shape; there is no builder because every field has an obvious single
/// override point and no cross-field validation is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address the HTTP server side binds to.
    pub bind_addr: SocketAddr,

    /// Timeout applied to every outbound RPC call.
    #[serde(with = "crate::util::duration_serde")]
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(DEFAULT_BIND_ADDR, DEFAULT_BIND_PORT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a configuration bound to a specific socket address.
    pub fn with_bind_addr(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }
}
