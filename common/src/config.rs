use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_WHOIS_SERVER: &str = "whois.arin.net";

/// What happens to a new domain's scope when its base domain already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BaseDomainPolicy {
    /// The domain takes over the base domain's flags, discarding its own.
    #[default]
    Inherit,
    /// Both sides end with the merged flags.
    Merge,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Skips resolving new domains, so no addresses get linked to them.
    pub no_dns: bool,
    /// Skips registry lookups; unknown addresses get a guessed block.
    pub no_whois: bool,
    pub whois_server: String,
    /// Nameserver for direct queries. The system resolver is used when unset.
    pub dns_server: Option<SocketAddr>,
    /// Upper bound for one registry lookup attempt.
    pub registry_timeout: Duration,
    pub dns_timeout: Duration,
    /// Prefix guessed for IPv6 addresses the registry knows nothing about.
    pub ipv6_fallback_prefix: u8,
    pub base_domain_policy: BaseDomainPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_dns: false,
            no_whois: false,
            whois_server: String::from(DEFAULT_WHOIS_SERVER),
            dns_server: None,
            registry_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(3),
            ipv6_fallback_prefix: 64,
            base_domain_policy: BaseDomainPolicy::Inherit,
        }
    }
}
