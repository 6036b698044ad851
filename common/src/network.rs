//! # Network Prefixes
//!
//! Helpers around [`IpNetwork`] used to key, compare and guess network blocks.
//!
//! * **[`range`]**: Inclusive IPv4 ranges, as published by RIPE-style registries.
//! * **[`private`]**: The table of private and reserved prefixes.

pub mod private;
pub mod range;

use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

use crate::error::AssetError;

/// Zeroes the host bits, so `10.1.2.3/8` and `10.0.0.0/8` share one key.
pub fn canonical(network: IpNetwork) -> IpNetwork {
    IpNetwork::new(network.network(), network.prefix()).unwrap_or(network)
}

/// Parses a prefix as written by humans or registries and canonicalizes it.
///
/// Accepts a bare address (host prefix) and the abbreviated IPv4 form some
/// registries publish (`200.3.12/22` for `200.3.12.0/22`).
pub fn parse_network(raw: &str) -> Result<IpNetwork, AssetError> {
    let raw = raw.trim();
    let invalid = || AssetError::InvalidNetworkBlock(raw.to_string());

    let (addr_str, prefix_str) = match raw.split_once('/') {
        Some((addr, prefix)) => (addr.trim(), Some(prefix.trim())),
        None => (raw, None),
    };

    let addr: IpAddr = match addr_str.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) => IpAddr::V4(pad_ipv4(addr_str).ok_or_else(invalid)?),
    };

    let prefix: u8 = match prefix_str {
        Some(p) => p.parse::<u8>().map_err(|_| invalid())?,
        None => max_prefix(&addr),
    };

    IpNetwork::new(addr, prefix)
        .map(canonical)
        .map_err(|_| invalid())
}

/// Expands `a.b.c` style partial dotted quads by appending zero octets.
fn pad_ipv4(partial: &str) -> Option<Ipv4Addr> {
    let octets: Vec<u8> = partial
        .split('.')
        .map(|octet| octet.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;

    if octets.is_empty() || octets.len() > 4 {
        return None;
    }

    let mut padded = [0u8; 4];
    padded[..octets.len()].copy_from_slice(&octets);
    Some(Ipv4Addr::from(padded))
}

pub fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Number of host bits, i.e. how wide the block is. Smaller is narrower.
pub fn host_bits(network: &IpNetwork) -> u8 {
    max_prefix(&network.ip()) - network.prefix()
}

/// Guessed block for an address nobody could tell us anything about.
///
/// IPv4 uses the `/24` spanned by the first three octets. IPv6 has no such
/// convention, so the caller picks the prefix (usually `/64`).
pub fn fallback_network(addr: IpAddr, ipv6_prefix: u8) -> Result<IpNetwork, AssetError> {
    let network = match addr {
        IpAddr::V4(v4) => Ipv4Network::new(v4, 24).map(IpNetwork::V4),
        IpAddr::V6(v6) => Ipv6Network::new(v6, ipv6_prefix).map(IpNetwork::V6),
    };

    network
        .map(canonical)
        .map_err(|e| AssetError::InvalidNetworkBlock(format!("{addr}: {e}")))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
