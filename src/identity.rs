//! Who and where the watcher reports from.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use serde::{Deserialize, Serialize};

/// Address used only to pick the outbound interface; no packet is sent.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Identity attached to every delivered match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub source_ip: String,
}

impl Identity {
    /// Resolve the identity, preferring explicit overrides.
    #[must_use]
    pub fn resolve(username: Option<&str>, source_ip: Option<&str>) -> Self {
        let username = username.map_or_else(current_username, String::from);
        let source_ip = source_ip.map_or_else(|| primary_ip().to_string(), String::from);
        Self {
            username,
            source_ip,
        }
    }
}

/// Login name from the environment, or `unknown`.
#[must_use]
pub fn current_username() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Address of the interface used for outbound traffic, or loopback.
#[must_use]
pub fn primary_ip() -> IpAddr {
    outbound_ip().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(ROUTE_PROBE_ADDR).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}
