use std::net::IpAddr;

use crate::error::AssetError;

/// Defines the contract for accepting raw address strings.
pub trait AddressValidator: Send + Sync {
    /// Parses `raw` as an IPv4 or IPv6 address.
    ///
    /// # Errors
    /// * [`AssetError::InvalidAddress`] if neither syntax matches.
    fn validate(&self, raw: &str) -> Result<IpAddr, AssetError>;
}
