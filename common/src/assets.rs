//! # Inventory Assets
//!
//! Entities of the reconnaissance inventory.
//!
//! Relationships are held as keys (block prefix, base-domain name, address set)
//! and resolved through an [`crate::ports::store::AssetStore`], never as
//! embedded references.
//!
//! ## Entities
//! * [`block::NetworkBlock`]: A registered or guessed prefix and its owner.
//! * [`address::Address`]: A single IP address, owned by exactly one block.
//! * [`domain::BaseDomain`]: The two-label root grouping related domains.
//! * [`domain::Domain`]: A fully qualified name and the addresses it resolves to.
//! * [`port::Port`]: A service record hanging off an address.

pub mod address;
pub mod block;
pub mod domain;
pub mod port;

pub use address::{Address, IpVersion};
pub use block::NetworkBlock;
pub use domain::{BaseDomain, Domain};
pub use port::Port;
