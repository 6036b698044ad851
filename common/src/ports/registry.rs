use std::net::IpAddr;

/// One network entry of a registry answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryNet {
    /// One or more prefixes, comma separated (`"8.0.0.0/9, 8.128.0.0/10"`).
    pub cidr: String,
    pub description: Option<String>,
}

impl RegistryNet {
    pub fn new(cidr: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            cidr: cidr.into(),
            description: description.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    pub nets: Vec<RegistryNet>,
    /// The answer as received, when the client has one.
    pub raw: Option<String>,
}

impl RegistryRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}

/// Defines the contract for authoritative ownership lookups (WHOIS-style).
#[async_trait::async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Looks up the networks registered around `ip`.
    ///
    /// With `with_referral` the client may follow a referral from the first
    /// registry to the one actually holding the record.
    async fn lookup(&self, ip: IpAddr, with_referral: bool) -> anyhow::Result<RegistryRecord>;
}
