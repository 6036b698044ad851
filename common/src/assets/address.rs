use std::fmt;
use std::net::IpAddr;

use crate::scope::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

/// A single address. `block` is set once, at creation, and never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub ip: IpAddr,
    pub version: IpVersion,
    /// Key of the owning [`crate::assets::NetworkBlock`].
    pub block: String,
    pub os: Option<String>,
    pub scope: Scope,
    /// Raw registry answer, kept when a lookup was needed to place the address.
    pub registry_text: Option<String>,
}

impl Address {
    pub fn new(ip: IpAddr, block: impl Into<String>, scope: Scope) -> Self {
        Self {
            ip,
            version: IpVersion::of(&ip),
            block: block.into(),
            os: None,
            scope,
            registry_text: None,
        }
    }

    pub fn with_registry_text(mut self, text: Option<String>) -> Self {
        self.registry_text = text;
        self
    }
}
