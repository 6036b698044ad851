//! # Network Block Discovery
//!
//! Finds the block that owns an address.
//!
//! Resolution order:
//! 1. **Catalog**: the narrowest stored block containing the address.
//! 2. **Private ranges**: reserved prefixes resolve locally, without a lookup.
//! 3. **Registry**: a lookup with referral, retried once without; the narrowest
//!    network of the answer wins.
//! 4. **Fallback**: a guessed `/24` (IPv4) or configurable prefix (IPv6) when the
//!    registry had nothing to say.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use pnet::ipnetwork::IpNetwork;
use scopekeep_common::assets::NetworkBlock;
use scopekeep_common::config::Config;
use scopekeep_common::error::AssetError;
use scopekeep_common::network::private::{NON_PUBLIC_ORG, PrivateRangeTable};
use scopekeep_common::network;
use scopekeep_common::ports::events::{EventKind, EventSink};
use scopekeep_common::ports::registry::{RegistryLookup, RegistryRecord};
use scopekeep_common::ports::store::AssetStore;
use scopekeep_common::scope::Scope;
use tracing::debug;

pub const WHOIS_FAILED_ORG: &str = "Whois failed to resolve.";
pub const UNKNOWN_ORG: &str = "Unknown organization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    PrivateRange,
    Registry,
    Fallback,
}

/// Registry-side answer for one address, before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub network: IpNetwork,
    pub org_name: String,
    pub origin: Origin,
    pub registry_text: Option<String>,
}

/// How an address came to its owning block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// A stored block already contained the address.
    Catalog(NetworkBlock),
    /// Discovery named a block that someone had stored meanwhile.
    Reused(NetworkBlock, Resolution),
    /// Discovery named a block that was created for this address.
    Discovered(NetworkBlock, Resolution),
}

impl Ownership {
    pub fn block(&self) -> &NetworkBlock {
        match self {
            Ownership::Catalog(block)
            | Ownership::Reused(block, _)
            | Ownership::Discovered(block, _) => block,
        }
    }

    pub fn registry_text(&self) -> Option<String> {
        match self {
            Ownership::Catalog(_) => None,
            Ownership::Reused(_, res) | Ownership::Discovered(_, res) => res.registry_text.clone(),
        }
    }
}

pub struct NetworkBlockDiscovery {
    registry: Arc<dyn RegistryLookup>,
    events: Arc<dyn EventSink>,
    private_ranges: PrivateRangeTable,
    lookup_timeout: Duration,
    ipv6_fallback_prefix: u8,
}

impl NetworkBlockDiscovery {
    pub fn new(registry: Arc<dyn RegistryLookup>, events: Arc<dyn EventSink>, cfg: &Config) -> Self {
        Self {
            registry,
            events,
            private_ranges: PrivateRangeTable::reserved().clone(),
            lookup_timeout: cfg.registry_timeout,
            ipv6_fallback_prefix: cfg.ipv6_fallback_prefix,
        }
    }

    pub fn with_private_ranges(mut self, table: PrivateRangeTable) -> Self {
        self.private_ranges = table;
        self
    }

    /// Returns the block owning `ip`, storing a discovered one if needed.
    ///
    /// A discovered block is keyed by its canonical prefix; if that key is
    /// already taken the stored row wins, organization name included.
    pub async fn owner_of(
        &self,
        store: &dyn AssetStore,
        ip: IpAddr,
    ) -> Result<Ownership, AssetError> {
        if let Some(block) = narrowest(store.find_containing(ip)) {
            debug!(%ip, block = %block.key(), "address falls into a known block");
            return Ok(Ownership::Catalog(block));
        }

        let resolution = self.resolve(ip).await?;
        let candidate = NetworkBlock::new(resolution.network, resolution.org_name.clone(), Scope::NONE);
        let (block, created) = store.insert_block(candidate);

        if created {
            self.events.notify(
                EventKind::New,
                &format!("New CIDR added: {} - {} {}", block.key(), block.org_name, block.scope),
            );
            Ok(Ownership::Discovered(block, resolution))
        } else {
            Ok(Ownership::Reused(block, resolution))
        }
    }

    /// Registry discovery for one address. Never touches the store.
    pub async fn resolve(&self, ip: IpAddr) -> Result<Resolution, AssetError> {
        if let Some(network) = self.private_ranges.containing(ip) {
            return Ok(Resolution {
                network,
                org_name: String::from(NON_PUBLIC_ORG),
                origin: Origin::PrivateRange,
                registry_text: None,
            });
        }

        let record = self.lookup_with_fallback(ip).await;

        if let Some((network, org_name)) = select_network(&record, ip) {
            debug!(%ip, %network, org = %org_name, "registry resolved network");
            return Ok(Resolution {
                network,
                org_name,
                origin: Origin::Registry,
                registry_text: record.raw,
            });
        }

        let network = network::fallback_network(ip, self.ipv6_fallback_prefix)?;
        self.events.notify(
            EventKind::Warning,
            &format!(
                "The networks didn't populate from whois. Defaulting to a /{}.",
                network.prefix()
            ),
        );

        Ok(Resolution {
            network,
            org_name: String::from(WHOIS_FAILED_ORG),
            origin: Origin::Fallback,
            registry_text: record.raw,
        })
    }

    async fn lookup_with_fallback(&self, ip: IpAddr) -> RegistryRecord {
        match self.bounded_lookup(ip, true).await {
            Ok(record) => return record,
            Err(e) => debug!(%ip, "registry lookup with referral failed: {e:#}"),
        }

        match self.bounded_lookup(ip, false).await {
            Ok(record) => record,
            Err(e) => {
                self.events
                    .notify(EventKind::Error, &format!("Error trying to resolve whois: {e:#}"));
                RegistryRecord::empty()
            }
        }
    }

    async fn bounded_lookup(&self, ip: IpAddr, with_referral: bool) -> anyhow::Result<RegistryRecord> {
        tokio::time::timeout(self.lookup_timeout, self.registry.lookup(ip, with_referral))
            .await
            .map_err(|_| anyhow::anyhow!("lookup of {ip} timed out after {:?}", self.lookup_timeout))?
    }
}

/// Longest prefix wins; equal prefixes are ordered by their key.
pub fn narrowest(blocks: Vec<NetworkBlock>) -> Option<NetworkBlock> {
    blocks.into_iter().min_by(|a, b| {
        a.host_bits()
            .cmp(&b.host_bits())
            .then_with(|| a.key().cmp(&b.key()))
    })
}

/// Picks the narrowest network of a registry answer that contains `ip`, and
/// its description.
///
/// Comma-joined prefix fields are split first. Candidates are ordered by
/// `(host bits, prefix, description)`; unparseable prefixes and networks not
/// containing `ip` are skipped.
pub fn select_network(record: &RegistryRecord, ip: IpAddr) -> Option<(IpNetwork, String)> {
    let mut candidates: Vec<(u8, String, Option<String>, IpNetwork)> = Vec::new();

    for net in &record.nets {
        for cidr in net.cidr.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            match network::parse_network(cidr) {
                Ok(parsed) if !parsed.contains(ip) => {
                    debug!(cidr, %ip, "skipping registry network not containing the address")
                }
                Ok(parsed) => candidates.push((
                    network::host_bits(&parsed),
                    parsed.to_string(),
                    net.description.clone(),
                    parsed,
                )),
                Err(_) => debug!(cidr, "skipping unparseable registry network"),
            }
        }
    }

    candidates
        .into_iter()
        .min_by(|a, b| (a.0, &a.1, &a.2).cmp(&(b.0, &b.1, &b.2)))
        .map(|(_, _, description, network)| {
            let org_name = description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| String::from(UNKNOWN_ORG));
            (network, org_name)
        })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
