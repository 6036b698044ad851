use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use crate::naming::DomainName;
use crate::scope::Scope;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseDomain {
    pub name: String,
    pub scope: Scope,
    /// Auxiliary DNS data (record type to values), filled by outside tooling.
    pub dns: BTreeMap<String, Vec<String>>,
}

impl BaseDomain {
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            dns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    /// Name of the owning [`BaseDomain`].
    pub base: String,
    pub addresses: BTreeSet<IpAddr>,
    pub scope: Scope,
    pub registry_text: Option<String>,
}

impl Domain {
    pub fn new(name: &DomainName, scope: Scope) -> Self {
        Self {
            name: name.name().to_string(),
            base: name.base().to_string(),
            addresses: BTreeSet::new(),
            scope,
            registry_text: None,
        }
    }

    pub fn is_linked_to(&self, ip: &IpAddr) -> bool {
        self.addresses.contains(ip)
    }
}
