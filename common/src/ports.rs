//! # Outbound Ports (Driven Actors)
//!
//! This module defines the contracts (traits) for everything the classification
//! engine needs from the outside world.
//!
//! ## What belongs here?
//! * **Repositories**: Asset storage with atomic get-or-create ([`store`]).
//! * **Gateways**: Registry lookups ([`registry`]) and name resolution ([`dns`]).
//! * **Helpers**: Address validation ([`validator`]) and notifications ([`events`]).
//!
//! ## Rules
//! 1. All items here must be `traits` (plus the plain data they exchange).
//! 2. No concrete implementations allowed.
//! 3. Using `assets` models in method signatures is allowed and encouraged.
//! 4. These traits are implemented in `scopekeep-core` and `scopekeep-protocols`.

pub mod dns;
pub mod events;
pub mod registry;
pub mod store;
pub mod validator;
