use std::net::IpAddr;

use scopekeep_common::error::AssetError;
use scopekeep_common::ports::validator::AddressValidator;

/// Accepts what `std` parses, after trimming whitespace and URI-style
/// brackets (`[2001:db8::1]`).
pub struct StdAddressValidator;

impl AddressValidator for StdAddressValidator {
    fn validate(&self, raw: &str) -> Result<IpAddr, AssetError> {
        let trimmed = raw.trim();
        let unbracketed = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed);

        unbracketed
            .parse::<IpAddr>()
            .map_err(|_| AssetError::InvalidAddress(raw.to_string()))
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
