use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

/// Represents a continuous range of IPv4 addresses, inclusive.
///
/// RIPE, APNIC and AFRINIC publish `inetnum` objects this way
/// (`193.0.0.0 - 193.0.7.255`) rather than as prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Parses `start - end`, whitespace around the dash optional.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.split_once('-')?;
        let start_addr = start.trim().parse::<Ipv4Addr>().ok()?;
        let end_addr = end.trim().parse::<Ipv4Addr>().ok()?;
        Some(Self::new(start_addr, end_addr))
    }

    /// Smallest list of prefixes covering exactly this range.
    ///
    /// An inverted range (start after end) covers nothing.
    pub fn to_networks(&self) -> Vec<Ipv4Network> {
        let mut networks = Vec::new();
        let mut start: u64 = u64::from(u32::from(self.start_addr));
        let end: u64 = u64::from(u32::from(self.end_addr));

        while start <= end {
            let aligned: u32 = start.trailing_zeros().min(32);
            let span: u64 = end - start + 1;
            let fits: u32 = 63 - span.leading_zeros();
            let bits: u32 = aligned.min(fits);

            if let Ok(net) = Ipv4Network::new(Ipv4Addr::from(start as u32), (32 - bits) as u8) {
                networks.push(net);
            }
            start += 1u64 << bits;
        }

        networks
    }

    /// The covering prefixes joined the way ARIN writes multi-prefix `CIDR:` lines.
    pub fn to_cidr_list(&self) -> String {
        self.to_networks()
            .iter()
            .map(|net| net.to_string())
            .collect::<Vec<String>>()
            .join(", ")
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
