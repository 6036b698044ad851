use std::net::IpAddr;

/// Defines the contract for turning a domain name into addresses.
#[async_trait::async_trait]
pub trait DnsResolver: Send + Sync {
    /// Every address the name resolves to. An unknown name is an empty list,
    /// not an error.
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<IpAddr>>;
}
