//! # Asset Classifier
//!
//! Creation-time classification of every asset kind, and the scope cascades
//! that keep related assets consistent.
//!
//! Each `observe_*` entry point is a get-or-create: an asset seen before is
//! returned as stored (`created == false`) and nothing else happens. A new one
//! goes through its pre-create step and is committed with an atomic insert.
//! A new domain is resolved before it is committed, so its row never shows up
//! without its addresses; the cascade runs right after the commit.
//!
//! ## Scope rules
//! * **Address → block**: an address placed in a known block adopts the
//!   block's flags. An address whose block was discovered for it keeps the
//!   flags it was observed with; the fresh block starts unscoped.
//! * **Domain → base domain**: a new base domain takes the domain's flags. An
//!   existing one either overwrites the domain's flags or merges with them,
//!   depending on [`BaseDomainPolicy`].
//! * **Domain ↔ address**: merged symmetrically, then propagated through the
//!   whole linked graph so the outcome does not depend on creation order.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scopekeep_common::assets::{Address, BaseDomain, Domain, NetworkBlock, Port};
use scopekeep_common::config::{BaseDomainPolicy, Config};
use scopekeep_common::error::AssetError;
use scopekeep_common::naming::DomainName;
use scopekeep_common::network;
use scopekeep_common::ports::dns::DnsResolver;
use scopekeep_common::ports::events::{EventKind, EventSink};
use scopekeep_common::ports::registry::RegistryLookup;
use scopekeep_common::ports::store::AssetStore;
use scopekeep_common::ports::validator::AddressValidator;
use scopekeep_common::scope::Scope;
use tokio::sync::watch;
use tracing::debug;

use crate::discovery::{NetworkBlockDiscovery, Ownership};
use crate::validator::StdAddressValidator;

/// An asset as stored after an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed<T> {
    pub asset: T,
    /// False when the asset existed already (or a concurrent caller won).
    pub created: bool,
}

impl<T> Observed<T> {
    fn new(asset: T) -> Self {
        Self { asset, created: true }
    }

    fn existing(asset: T) -> Self {
        Self {
            asset,
            created: false,
        }
    }
}

/// Result of [`AssetClassifier::observe`], tagged with the kind it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Block(Observed<NetworkBlock>),
    Address(Observed<Address>),
    Domain(Observed<Domain>),
}

/// A domain creation under way. Racing callers leave their flags here.
struct Flight {
    joined: Scope,
    done: watch::Receiver<bool>,
}

enum Claim {
    Existing(Domain),
    Joined(watch::Receiver<bool>),
    Owner(watch::Sender<bool>),
}

/// Held by the caller creating a domain. Dropping it clears the flight, so
/// callers waiting on a creator that never finished can claim again.
struct FlightGuard<'a> {
    flights: &'a Flights,
    name: &'a str,
    done: watch::Sender<bool>,
}

impl FlightGuard<'_> {
    fn take_joined(&self) -> Scope {
        lock_flights(self.flights)
            .get_mut(self.name)
            .map(|flight| std::mem::replace(&mut flight.joined, Scope::NONE))
            .unwrap_or(Scope::NONE)
    }

    /// Flags joined since the last call, or `None` once the flight is closed.
    fn settle(&self) -> Option<Scope> {
        let mut flights = lock_flights(self.flights);
        match flights.get_mut(self.name) {
            Some(flight) if flight.joined != Scope::NONE => {
                Some(std::mem::replace(&mut flight.joined, Scope::NONE))
            }
            _ => {
                flights.remove(self.name);
                None
            }
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        lock_flights(self.flights).remove(self.name);
    }
}

type Flights = Mutex<HashMap<String, Flight>>;

fn lock_flights(flights: &Flights) -> MutexGuard<'_, HashMap<String, Flight>> {
    flights.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Domain(String),
    Address(IpAddr),
}

pub struct AssetClassifier {
    store: Arc<dyn AssetStore>,
    discovery: NetworkBlockDiscovery,
    dns: Arc<dyn DnsResolver>,
    validator: Arc<dyn AddressValidator>,
    events: Arc<dyn EventSink>,
    base_domain_policy: BaseDomainPolicy,
    flights: Flights,
}

impl AssetClassifier {
    pub fn new(
        store: Arc<dyn AssetStore>,
        registry: Arc<dyn RegistryLookup>,
        dns: Arc<dyn DnsResolver>,
        events: Arc<dyn EventSink>,
        cfg: &Config,
    ) -> Self {
        Self {
            store,
            discovery: NetworkBlockDiscovery::new(registry, events.clone(), cfg),
            dns,
            validator: Arc::new(StdAddressValidator),
            events,
            base_domain_policy: cfg.base_domain_policy,
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn AddressValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn store(&self) -> &dyn AssetStore {
        self.store.as_ref()
    }

    pub fn discovery(&self) -> &NetworkBlockDiscovery {
        &self.discovery
    }

    /// Reads `raw` as a prefix, an address or a domain name, in that order.
    pub async fn observe(&self, raw: &str, scope: Scope) -> Result<Observation, AssetError> {
        let raw = raw.trim();
        if raw.contains('/') {
            return Ok(Observation::Block(self.observe_block(raw, None, scope).await?));
        }
        if let Ok(ip) = self.validator.validate(raw) {
            return Ok(Observation::Address(self.observe_ip(ip, scope).await?));
        }
        Ok(Observation::Domain(self.observe_domain(raw, scope).await?))
    }

    // ─── Network blocks ───────────────────────────────────────────────────

    pub async fn observe_block(
        &self,
        raw: &str,
        org_name: Option<&str>,
        scope: Scope,
    ) -> Result<Observed<NetworkBlock>, AssetError> {
        let network = network::parse_network(raw)?;
        if let Some(existing) = self.store.block(&network.to_string()) {
            return Ok(Observed::existing(existing));
        }

        let mut block = NetworkBlock::new(network, org_name.unwrap_or_default().trim(), scope);
        self.on_network_block_create(&mut block).await?;

        let (block, created) = self.store.insert_block(block);
        if !created {
            return Ok(Observed::existing(block));
        }

        self.events.notify(
            EventKind::New,
            &format!("New CIDR added: {} - {} {}", block.key(), block.org_name, block.scope),
        );
        Ok(Observed::new(block))
    }

    /// Fills a missing organization name from registry discovery.
    async fn on_network_block_create(&self, block: &mut NetworkBlock) -> Result<(), AssetError> {
        if block.org_name.is_empty() {
            let resolution = self.discovery.resolve(block.network.network()).await?;
            block.org_name = resolution.org_name;
        }
        Ok(())
    }

    // ─── Addresses ────────────────────────────────────────────────────────

    /// # Errors
    /// * [`AssetError::InvalidAddress`] if `raw` is neither IPv4 nor IPv6.
    pub async fn observe_address(
        &self,
        raw: &str,
        scope: Scope,
    ) -> Result<Observed<Address>, AssetError> {
        let ip = self.validator.validate(raw)?;
        self.observe_ip(ip, scope).await
    }

    pub async fn observe_ip(&self, ip: IpAddr, scope: Scope) -> Result<Observed<Address>, AssetError> {
        if let Some(existing) = self.store.address(ip) {
            return Ok(Observed::existing(existing));
        }

        let address = self.on_address_create(ip, scope).await?;
        let (address, created) = self.store.insert_address(address);
        if !created {
            return Ok(Observed::existing(address));
        }

        self.events.notify(
            EventKind::New,
            &format!("New IP added: {}  {}", address.ip, address.scope),
        );
        Ok(Observed::new(address))
    }

    async fn on_address_create(&self, ip: IpAddr, requested: Scope) -> Result<Address, AssetError> {
        let ownership = self.discovery.owner_of(self.store.as_ref(), ip).await?;

        let scope = match &ownership {
            Ownership::Discovered(..) => requested,
            Ownership::Catalog(block) | Ownership::Reused(block, _) => block.scope,
        };

        Ok(Address::new(ip, ownership.block().key(), scope)
            .with_registry_text(ownership.registry_text()))
    }

    // ─── Domains ──────────────────────────────────────────────────────────

    /// Callers observing a name while its creation is under way join that
    /// creation: their flags are merged into the new row and they all get
    /// the settled row back.
    ///
    /// # Errors
    /// * [`AssetError::InvalidDomain`] if no base domain can be derived.
    pub async fn observe_domain(
        &self,
        raw: &str,
        scope: Scope,
    ) -> Result<Observed<Domain>, AssetError> {
        let name = DomainName::parse(raw)?;
        loop {
            match self.claim_domain(name.name(), scope) {
                Claim::Existing(domain) => return Ok(Observed::existing(domain)),
                Claim::Joined(mut done) => {
                    let finished = done.wait_for(|finished| *finished).await.is_ok();
                    if finished && let Some(domain) = self.store.domain(name.name()) {
                        return Ok(Observed::existing(domain));
                    }
                    // The creator went away before committing; try again.
                }
                Claim::Owner(done) => {
                    let flight = FlightGuard {
                        flights: &self.flights,
                        name: name.name(),
                        done,
                    };
                    return Ok(Observed::new(self.create_domain(&name, scope, flight).await));
                }
            }
        }
    }

    fn claim_domain(&self, name: &str, requested: Scope) -> Claim {
        let mut flights = lock_flights(&self.flights);
        if let Some(flight) = flights.get_mut(name) {
            flight.joined = flight.joined.merge(requested);
            return Claim::Joined(flight.done.clone());
        }
        if let Some(existing) = self.store.domain(name) {
            return Claim::Existing(existing);
        }

        let (tx, rx) = watch::channel(false);
        flights.insert(
            name.to_string(),
            Flight {
                joined: Scope::NONE,
                done: rx,
            },
        );
        Claim::Owner(tx)
    }

    /// Attaches the base domain and settles the new domain's flags against it.
    fn on_domain_create(&self, name: &DomainName, requested: Scope) -> Domain {
        let (base, created) = self
            .store
            .insert_base_domain(BaseDomain::new(name.base(), requested));

        let scope = if created {
            self.events.notify(
                EventKind::New,
                &format!("New base domain added: {}  {}", base.name, base.scope),
            );
            requested
        } else {
            match self.base_domain_policy {
                BaseDomainPolicy::Inherit => base.scope,
                BaseDomainPolicy::Merge => {
                    let merged = base.scope.merge(requested);
                    self.store
                        .update_base_domain(&base.name, &mut |row| row.scope = row.scope.merge(merged))
                        .map(|row| row.scope)
                        .unwrap_or(merged)
                }
            }
        };

        Domain::new(name, scope)
    }

    /// Resolves the domain, commits it with its links and merged flags, then
    /// spreads those flags over the linked graph.
    async fn create_domain(
        &self,
        name: &DomainName,
        requested: Scope,
        flight: FlightGuard<'_>,
    ) -> Domain {
        let mut domain = self.on_domain_create(name, requested);
        let linked = self.resolve_links(&domain.name).await;

        let merged = linked
            .iter()
            .fold(domain.scope, |acc, (_, scope)| acc.merge(*scope))
            .merge(flight.take_joined());
        domain.scope = merged;
        domain.addresses.extend(linked.iter().map(|(ip, _)| *ip));

        let (stored, created) = self.store.insert_domain(domain);
        if created {
            self.events.notify(
                EventKind::New,
                &format!("New domain added: {}  {}", stored.name, stored.scope),
            );
        } else {
            self.store.update_domain(&stored.name, &mut |row| {
                row.addresses.extend(linked.iter().map(|(ip, _)| *ip))
            });
        }

        let mut seeds = vec![Node::Domain(stored.name.clone())];
        seeds.extend(linked.iter().map(|(ip, _)| Node::Address(*ip)));
        self.propagate(seeds, merged);

        for (ip, _) in &linked {
            if let Some(address) = self.store.address(*ip) {
                self.events.notify(
                    EventKind::New,
                    &format!(
                        "IP and Domain {}/{} scope updated to:  {}",
                        ip, stored.name, address.scope
                    ),
                );
            }
        }

        while let Some(joined) = flight.settle() {
            self.propagate(vec![Node::Domain(stored.name.clone())], joined);
        }
        flight.done.send_replace(true);

        self.store.domain(&stored.name).unwrap_or(stored)
    }

    /// Observes every address `name` resolves to, with the flags each ended up with.
    async fn resolve_links(&self, name: &str) -> Vec<(IpAddr, Scope)> {
        let resolved = match self.dns.resolve(name).await {
            Ok(resolved) => resolved,
            Err(e) => {
                self.events
                    .notify(EventKind::Error, &format!("Error resolving {name}: {e:#}"));
                return Vec::new();
            }
        };

        let mut linked = Vec::new();
        for ip in resolved {
            match self.observe_ip(ip, Scope::NONE).await {
                Ok(observed) => linked.push((ip, observed.asset.scope)),
                Err(e) => self.events.notify(
                    EventKind::Warning,
                    &format!("Skipping {ip} for {name}: {e}"),
                ),
            }
        }
        linked
    }

    /// Raises `scope` on the seeds, then spreads every change over the
    /// domain↔address links until nothing moves.
    ///
    /// Seeds always pass their resulting flags on to their neighbors; other
    /// nodes only do so when they changed. Links must be stored before calling.
    fn propagate(&self, seeds: Vec<Node>, scope: Scope) {
        let mut queue: VecDeque<(Node, Scope, bool)> =
            seeds.into_iter().map(|node| (node, scope, true)).collect();

        while let Some((node, incoming, seed)) = queue.pop_front() {
            let mut changed = false;
            match node {
                Node::Domain(name) => {
                    let updated = self.store.update_domain(&name, &mut |row| {
                        changed = !row.scope.covers(&incoming);
                        row.scope = row.scope.merge(incoming);
                    });
                    let Some(domain) = updated else { continue };
                    if changed {
                        debug!(domain = %domain.name, scope = %domain.scope, "domain scope raised");
                    }
                    if changed || seed {
                        queue.extend(
                            domain
                                .addresses
                                .iter()
                                .map(|ip| (Node::Address(*ip), domain.scope, false)),
                        );
                    }
                }
                Node::Address(ip) => {
                    let updated = self.store.update_address(ip, &mut |row| {
                        changed = !row.scope.covers(&incoming);
                        row.scope = row.scope.merge(incoming);
                    });
                    let Some(address) = updated else { continue };
                    if changed {
                        debug!(%ip, scope = %address.scope, "address scope raised");
                    }
                    if changed || seed {
                        queue.extend(
                            self.store
                                .domains_linked_to(ip)
                                .into_iter()
                                .map(|domain| (Node::Domain(domain.name), address.scope, false)),
                        );
                    }
                }
            }
        }
    }

    // ─── Ports ────────────────────────────────────────────────────────────

    /// Stores a port record, observing its address first if needed.
    pub async fn record_port(&self, port: Port) -> Result<Port, AssetError> {
        self.observe_ip(port.ip, Scope::NONE).await?;
        self.store.add_port(port.clone())?;
        Ok(port)
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
