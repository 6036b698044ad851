//! In-memory [`AssetStore`]: one ordered map per asset kind behind an `RwLock`.
//!
//! Get-or-create and updates run under the write guard of their table, which
//! is what makes them atomic. No guard is ever held across an `.await`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

use scopekeep_common::assets::{Address, BaseDomain, Domain, NetworkBlock, Port};
use scopekeep_common::error::AssetError;
use scopekeep_common::ports::store::AssetStore;

struct Table<K, V> {
    rows: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord, V: Clone> Table<K, V> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.get(key).cloned()
    }

    fn get_or_insert(&self, key: K, row: V) -> (V, bool) {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.entry(key) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => (slot.insert(row).clone(), true),
        }
    }

    fn update<Q>(&self, key: &Q, apply: &mut dyn FnMut(&mut V)) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let row = rows.get_mut(key)?;
        apply(row);
        Some(row.clone())
    }

    fn filter(&self, keep: impl Fn(&V) -> bool) -> Vec<V> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.values().filter(|row| keep(row)).cloned().collect()
    }

    fn all(&self) -> Vec<V> {
        self.filter(|_| true)
    }
}

pub struct MemoryStore {
    blocks: Table<String, NetworkBlock>,
    addresses: Table<IpAddr, Address>,
    base_domains: Table<String, BaseDomain>,
    domains: Table<String, Domain>,
    ports: RwLock<Vec<Port>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blocks: Table::new(),
            addresses: Table::new(),
            base_domains: Table::new(),
            domains: Table::new(),
            ports: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore for MemoryStore {
    fn block(&self, key: &str) -> Option<NetworkBlock> {
        self.blocks.get(key)
    }

    fn insert_block(&self, block: NetworkBlock) -> (NetworkBlock, bool) {
        self.blocks.get_or_insert(block.key(), block)
    }

    fn blocks(&self) -> Vec<NetworkBlock> {
        self.blocks.all()
    }

    fn find_containing(&self, ip: IpAddr) -> Vec<NetworkBlock> {
        self.blocks.filter(|block| block.contains(ip))
    }

    fn address(&self, ip: IpAddr) -> Option<Address> {
        self.addresses.get(&ip)
    }

    fn insert_address(&self, address: Address) -> (Address, bool) {
        self.addresses.get_or_insert(address.ip, address)
    }

    fn update_address(&self, ip: IpAddr, apply: &mut dyn FnMut(&mut Address)) -> Option<Address> {
        self.addresses.update(&ip, apply)
    }

    fn addresses(&self) -> Vec<Address> {
        self.addresses.all()
    }

    fn base_domain(&self, name: &str) -> Option<BaseDomain> {
        self.base_domains.get(name)
    }

    fn insert_base_domain(&self, base: BaseDomain) -> (BaseDomain, bool) {
        self.base_domains.get_or_insert(base.name.clone(), base)
    }

    fn update_base_domain(
        &self,
        name: &str,
        apply: &mut dyn FnMut(&mut BaseDomain),
    ) -> Option<BaseDomain> {
        self.base_domains.update(name, apply)
    }

    fn base_domains(&self) -> Vec<BaseDomain> {
        self.base_domains.all()
    }

    fn domain(&self, name: &str) -> Option<Domain> {
        self.domains.get(name)
    }

    fn insert_domain(&self, domain: Domain) -> (Domain, bool) {
        self.domains.get_or_insert(domain.name.clone(), domain)
    }

    fn update_domain(&self, name: &str, apply: &mut dyn FnMut(&mut Domain)) -> Option<Domain> {
        self.domains.update(name, apply)
    }

    fn domains(&self) -> Vec<Domain> {
        self.domains.all()
    }

    fn domains_linked_to(&self, ip: IpAddr) -> Vec<Domain> {
        self.domains.filter(|domain| domain.is_linked_to(&ip))
    }

    fn add_port(&self, port: Port) -> Result<(), AssetError> {
        if self.addresses.get(&port.ip).is_none() {
            return Err(AssetError::UnknownAddress(port.ip));
        }
        let mut ports = self.ports.write().unwrap_or_else(PoisonError::into_inner);
        ports.push(port);
        Ok(())
    }

    fn ports_of(&self, ip: IpAddr) -> Vec<Port> {
        let ports = self.ports.read().unwrap_or_else(PoisonError::into_inner);
        ports.iter().filter(|port| port.ip == ip).cloned().collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use scopekeep_common::scope::Scope;
    use std::sync::Arc;

    fn block(prefix: &str, org: &str) -> NetworkBlock {
        NetworkBlock::new(prefix.parse().unwrap(), org, Scope::NONE)
    }

    #[test]
    fn test_insert_block_is_get_or_create() {
        let store = MemoryStore::new();
        let (first, created) = store.insert_block(block("10.0.0.0/8", "first"));
        assert!(created);
        assert_eq!(first.org_name, "first");

        let (second, created) = store.insert_block(block("10.0.0.0/8", "second"));
        assert!(!created);
        assert_eq!(second.org_name, "first");
        assert_eq!(store.blocks().len(), 1);
    }

    #[test]
    fn test_block_key_is_canonical() {
        let store = MemoryStore::new();
        store.insert_block(block("10.9.9.9/8", "corp"));
        assert!(store.block("10.0.0.0/8").is_some());

        let (_, created) = store.insert_block(block("10.0.0.0/8", "other"));
        assert!(!created);
    }

    #[test]
    fn test_find_containing() {
        let store = MemoryStore::new();
        store.insert_block(block("10.0.0.0/8", "wide"));
        store.insert_block(block("10.1.0.0/16", "narrow"));
        store.insert_block(block("192.168.0.0/16", "home"));

        let found = store.find_containing("10.1.2.3".parse().unwrap());
        assert_eq!(found.len(), 2);
        assert!(store.find_containing("8.8.8.8".parse().unwrap()).is_empty());
    }

    #[test]
    fn test_update_address() {
        let store = MemoryStore::new();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        store.insert_address(Address::new(ip, "10.0.0.0/8", Scope::NONE));

        let updated = store
            .update_address(ip, &mut |row| row.scope = row.scope.merge(Scope::new(true, false)))
            .unwrap();
        assert_eq!(updated.scope, Scope::new(true, false));
        assert_eq!(store.address(ip).unwrap().scope, Scope::new(true, false));

        let missing: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(store.update_address(missing, &mut |_| {}).is_none());
    }

    #[test]
    fn test_ports_need_an_address() {
        let store = MemoryStore::new();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(
            store.add_port(Port::new(ip, 22, "tcp")),
            Err(AssetError::UnknownAddress(ip))
        );

        store.insert_address(Address::new(ip, "10.0.0.0/8", Scope::NONE));
        store.add_port(Port::new(ip, 22, "tcp").with_service("ssh")).unwrap();
        store.add_port(Port::new(ip, 22, "tcp").with_service("ssh")).unwrap();
        assert_eq!(store.ports_of(ip).len(), 2);
    }

    #[test]
    fn test_concurrent_get_or_create_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .insert_block(block("8.8.8.0/24", &format!("writer {i}")))
                        .1
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|created| *created)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.blocks().len(), 1);
    }

    #[test]
    fn test_concurrent_updates_lose_no_flag() {
        let store = Arc::new(MemoryStore::new());
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        store.insert_address(Address::new(ip, "8.8.8.0/24", Scope::NONE));

        let flags = [Scope::new(true, false), Scope::new(false, true)];
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                let flag = flags[i % 2];
                std::thread::spawn(move || {
                    store.update_address(ip, &mut |row| row.scope = row.scope.merge(flag));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.address(ip).unwrap().scope, Scope::FULL);
    }
}
