use std::net::IpAddr;

use pnet::ipnetwork::IpNetwork;

use crate::network;
use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBlock {
    pub network: IpNetwork,
    pub org_name: String,
    pub scope: Scope,
}

impl NetworkBlock {
    /// Builds a block keyed by the canonical form of `network`.
    pub fn new(network: IpNetwork, org_name: impl Into<String>, scope: Scope) -> Self {
        Self {
            network: network::canonical(network),
            org_name: org_name.into(),
            scope,
        }
    }

    /// Unique key of the block, e.g. `10.0.0.0/8`.
    pub fn key(&self) -> String {
        self.network.to_string()
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.network.contains(addr)
    }

    pub fn host_bits(&self) -> u8 {
        network::host_bits(&self.network)
    }
}
