//! # scopekeep common
//!
//! Shared vocabulary of the asset inventory.
//!
//! * **[`assets`]**: The inventory entities (blocks, addresses, domains, ports).
//! * **[`scope`]**: Active/passive scope flags and their monotonic merge.
//! * **[`naming`]**: Domain name canonicalization and base-domain derivation.
//! * **[`network`]**: Prefix parsing helpers and the private-range table.
//! * **[`ports`]**: Traits for the collaborators the engine is driven through.
//! * **[`config`]**: Runtime switches shared by the engine and its adapters.
//! * **[`error`]**: Validation failures surfaced to callers.

pub mod assets;
pub mod config;
pub mod error;
pub mod naming;
pub mod network;
pub mod ports;
pub mod scope;
