use std::net::IpAddr;

use crate::assets::{Address, BaseDomain, Domain, NetworkBlock, Port};
use crate::error::AssetError;

/// Defines the contract for persisting inventory assets.
///
/// # Atomicity
/// * `insert_*` is a get-or-create: when the key already exists the stored row
///   is returned untouched with `false`, otherwise the given row is stored and
///   returned with `true`. Concurrent inserts of one key must yield exactly one
///   `true`.
/// * `update_*` applies the closure to the stored row while holding whatever
///   guard makes the read-modify-write atomic, and returns the updated row.
///   Scope merges rely on this to never lose a flag.
pub trait AssetStore: Send + Sync {
    fn block(&self, key: &str) -> Option<NetworkBlock>;
    fn insert_block(&self, block: NetworkBlock) -> (NetworkBlock, bool);
    fn blocks(&self) -> Vec<NetworkBlock>;
    /// Every block whose prefix contains `ip`, in no particular order.
    fn find_containing(&self, ip: IpAddr) -> Vec<NetworkBlock>;

    fn address(&self, ip: IpAddr) -> Option<Address>;
    fn insert_address(&self, address: Address) -> (Address, bool);
    fn update_address(&self, ip: IpAddr, apply: &mut dyn FnMut(&mut Address)) -> Option<Address>;
    fn addresses(&self) -> Vec<Address>;

    fn base_domain(&self, name: &str) -> Option<BaseDomain>;
    fn insert_base_domain(&self, base: BaseDomain) -> (BaseDomain, bool);
    fn update_base_domain(
        &self,
        name: &str,
        apply: &mut dyn FnMut(&mut BaseDomain),
    ) -> Option<BaseDomain>;
    fn base_domains(&self) -> Vec<BaseDomain>;

    fn domain(&self, name: &str) -> Option<Domain>;
    fn insert_domain(&self, domain: Domain) -> (Domain, bool);
    fn update_domain(&self, name: &str, apply: &mut dyn FnMut(&mut Domain)) -> Option<Domain>;
    fn domains(&self) -> Vec<Domain>;
    /// Domains whose address set contains `ip`.
    fn domains_linked_to(&self, ip: IpAddr) -> Vec<Domain>;

    /// Appends a port record. Fails when the address is not in the store.
    fn add_port(&self, port: Port) -> Result<(), AssetError>;
    fn ports_of(&self, ip: IpAddr) -> Vec<Port>;
}
