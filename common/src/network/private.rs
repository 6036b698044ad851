//! # Private and Reserved Prefixes
//!
//! Addresses in these blocks belong to nobody a registry could name, so they
//! are resolved locally and never looked up.

use std::net::IpAddr;
use std::sync::OnceLock;

use pnet::ipnetwork::IpNetwork;

pub const NON_PUBLIC_ORG: &str = "Non-Public Subnet";

const RESERVED_PREFIXES: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "::1/128",
    "::/128",
    "fc00::/7",
    "fe80::/10",
    "ff00::/8",
    "2001:db8::/32",
];

static RESERVED: OnceLock<PrivateRangeTable> = OnceLock::new();

/// Static set of well-known private/reserved prefixes.
#[derive(Debug, Clone)]
pub struct PrivateRangeTable {
    networks: Vec<IpNetwork>,
}

impl PrivateRangeTable {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self { networks }
    }

    /// The built-in table (RFC 1918, loopback, link-local, documentation,
    /// multicast and friends).
    pub fn reserved() -> &'static PrivateRangeTable {
        RESERVED.get_or_init(|| {
            let networks = RESERVED_PREFIXES
                .iter()
                .filter_map(|prefix| prefix.parse::<IpNetwork>().ok())
                .collect();
            PrivateRangeTable::new(networks)
        })
    }

    /// First table entry containing `addr`.
    pub fn containing(&self, addr: IpAddr) -> Option<IpNetwork> {
        self.networks.iter().copied().find(|net| net.contains(addr))
    }

    pub fn networks(&self) -> &[IpNetwork] {
        &self.networks
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
