use std::net::IpAddr;

use thiserror::Error;

/// Validation failures that abort the creation of a single asset.
///
/// Registry and DNS trouble never shows up here: those degrade to fallbacks
/// and are reported through the event sink instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("not a valid IPv4 or IPv6 address: {0}")]
    InvalidAddress(String),

    #[error("invalid domain name provided: {0}")]
    InvalidDomain(String),

    #[error("invalid network block: {0}")]
    InvalidNetworkBlock(String),

    #[error("no address {0} in the inventory")]
    UnknownAddress(IpAddr),
}
