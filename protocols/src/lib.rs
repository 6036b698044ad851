//! # scopekeep protocols
//!
//! Network adapters behind the engine's outbound ports.
//!
//! * **[`whois`]**: Port-43 registry client (ARIN first, referrals followed).
//! * **[`dns`]**: Forward resolution, either direct over UDP or via the system.

pub mod dns;
pub mod whois;
