//! # scopekeep core
//!
//! The classification engine and its in-process adapters.
//!
//! * **[`classifier`]**: Get-or-create entry points and scope cascades.
//! * **[`discovery`]**: Owning-block resolution (catalog, private ranges, registry, fallback).
//! * **[`store`]**: In-memory [`AssetStore`](scopekeep_common::ports::store::AssetStore).
//! * **[`events`]**: Event sink writing through `tracing`.
//! * **[`validator`]**: Standard-library address validation.

pub mod classifier;
pub mod discovery;
pub mod events;
pub mod store;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use classifier::{AssetClassifier, Observation, Observed};
pub use discovery::NetworkBlockDiscovery;
pub use store::MemoryStore;
