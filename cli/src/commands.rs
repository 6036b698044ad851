pub mod classify;
pub mod lookup;

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use scopekeep_common::config::{BaseDomainPolicy, Config, DEFAULT_WHOIS_SERVER};
use scopekeep_protocols::dns::DNS_PORT;

#[derive(Parser)]
#[command(name = "scopekeep")]
#[command(about = "Classifies recon assets into network blocks and keeps their scope consistent.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Do not resolve domains, so no addresses get linked to them
    #[arg(long, global = true)]
    pub no_dns: bool,

    /// Do not query registries; unknown addresses get a guessed block
    #[arg(long, global = true)]
    pub no_whois: bool,

    /// First registry to ask
    #[arg(long, global = true, value_name = "HOST", default_value = DEFAULT_WHOIS_SERVER)]
    pub whois_server: String,

    /// Nameserver to query directly instead of the system resolver
    #[arg(long, global = true, value_name = "ADDR", value_parser = parse_nameserver)]
    pub dns_server: Option<SocketAddr>,

    /// Seconds to wait for one registry or DNS answer
    #[arg(long, global = true, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// Prefix length guessed for IPv6 addresses the registry does not know
    #[arg(long, global = true, value_name = "N", default_value_t = 64,
          value_parser = clap::value_parser!(u8).range(1..=128))]
    pub ipv6_fallback_prefix: u8,

    /// Merge a new domain's scope into an existing base domain instead of inheriting it
    #[arg(long, global = true)]
    pub merge_base_scope: bool,

    /// Show lookup details (-v) or everything (-vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Observe targets (prefixes, addresses or domains) and print the inventory
    #[command(alias = "c")]
    Classify {
        /// Mark observed targets as in active scope
        #[arg(long)]
        active: bool,
        /// Mark observed targets as in passive scope
        #[arg(long)]
        passive: bool,
        /// Known in-scope block to store before anything is observed
        #[arg(long = "scope", value_name = "BLOCK")]
        scope: Vec<String>,
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Resolve the owning block of one address without storing anything
    #[command(alias = "l")]
    Lookup { address: String },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let timeout = Duration::from_secs(self.timeout);
        Config {
            no_dns: self.no_dns,
            no_whois: self.no_whois,
            whois_server: self.whois_server.clone(),
            dns_server: self.dns_server,
            registry_timeout: timeout,
            dns_timeout: timeout,
            ipv6_fallback_prefix: self.ipv6_fallback_prefix,
            base_domain_policy: if self.merge_base_scope {
                BaseDomainPolicy::Merge
            } else {
                BaseDomainPolicy::Inherit
            },
        }
    }
}

/// Accepts `IP` or `IP:PORT`, port 53 by default.
fn parse_nameserver(raw: &str) -> Result<SocketAddr, String> {
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Ok(addr);
    }
    raw.trim_matches(|c| c == '[' || c == ']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| format!("not a nameserver address: {raw}"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
