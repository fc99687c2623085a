//! Advertised host resolution.
//!
//! Services bound to the wildcard address `0.0.0.0` must publish a concrete
//! address in their metadata. A [`HostResolver`] supplies it.

use std::net::{IpAddr, ToSocketAddrs};

use tracing::debug;

use crate::error::Error;

/// Produces the concrete address advertised for wildcard bindings.
pub trait HostResolver: Send + Sync {
    fn resolve(&self) -> Result<String, Error>;
}

/// Resolves the machine's hostname through the system resolver.
///
/// The hostname is read from `HOSTNAME`, then `/etc/hostname`, then
/// `/proc/sys/kernel/hostname`. The first IPv4 address it resolves to is
/// preferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostResolver;

impl SystemHostResolver {
    fn hostname() -> Option<String> {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
            .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

impl HostResolver for SystemHostResolver {
    fn resolve(&self) -> Result<String, Error> {
        let hostname = Self::hostname()
            .ok_or_else(|| Error::HostResolution("hostname is not available".to_string()))?;

        let addresses: Vec<IpAddr> = (hostname.as_str(), 0)
            .to_socket_addrs()
            .map_err(|e| Error::HostResolution(format!("{}: {}", hostname, e)))?
            .map(|addr| addr.ip())
            .collect();

        let address = addresses
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addresses.first())
            .ok_or_else(|| Error::HostResolution(format!("{} has no address", hostname)))?;

        debug!("Resolved hostname {} to {}", hostname, address);
        Ok(address.to_string())
    }
}

/// Always advertises the same host.
#[derive(Debug, Clone)]
pub struct FixedHost(String);

impl FixedHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }
}

impl HostResolver for FixedHost {
    fn resolve(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}
