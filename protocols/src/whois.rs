//! # WHOIS Registry Client
//!
//! Plain-text registry lookups over TCP port 43.
//!
//! ARIN is asked first with its `n + <ip>` query, which lists every network
//! around the address. When referrals are enabled and the answer points at
//! another registry (`ReferralServer:`, `refer:` or `whois:`), that registry
//! is asked as well and its answer is the one parsed.
//!
//! ## Parsing
//! A network starts at `NetRange:`, `inetnum:` or `inet6num:`. Fields that
//! follow are attached to it until the next network starts:
//! * `CIDR:` replaces the prefix list of an ARIN network.
//! * `OrgName:`, `CustName:`, `org-name:`, `owner:`, `descr:`, `Organization:`
//!   and the network name compete for the description, in that order of
//!   preference.
//!
//! `inetnum` ranges are converted to comma-joined prefix lists.

use std::net::IpAddr;
use std::time::Duration;

use scopekeep_common::config::Config;
use scopekeep_common::network::range::Ipv4Range;
use scopekeep_common::ports::registry::{RegistryLookup, RegistryNet, RegistryRecord};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const WHOIS_PORT: u16 = 43;

/// Answers beyond this size are truncated.
const MAX_RESPONSE: u64 = 256 * 1024;

#[derive(Debug, Error)]
pub enum WhoisError {
    #[error("could not connect to whois server {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error while talking to whois server {server}: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("whois server {0} did not answer in time")]
    Timeout(String),
    #[error("whois server {0} sent an empty answer")]
    Empty(String),
}

pub struct WhoisClient {
    server: String,
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.whois_server.clone(), cfg.registry_timeout)
    }

    async fn query(&self, server: &str, ip: IpAddr) -> Result<String, WhoisError> {
        let addr = with_port(server);
        let request = query_for(server, ip);
        debug!(%addr, %request, "sending whois query");

        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| WhoisError::Timeout(addr.clone()))?
            .map_err(|source| WhoisError::Connect {
                server: addr.clone(),
                source,
            })?;

        stream
            .write_all(format!("{request}\r\n").as_bytes())
            .await
            .map_err(|source| WhoisError::Io {
                server: addr.clone(),
                source,
            })?;

        let mut buffer: Vec<u8> = Vec::new();
        timeout(self.timeout, (&mut stream).take(MAX_RESPONSE).read_to_end(&mut buffer))
            .await
            .map_err(|_| WhoisError::Timeout(addr.clone()))?
            .map_err(|source| WhoisError::Io {
                server: addr.clone(),
                source,
            })?;

        if buffer.is_empty() {
            return Err(WhoisError::Empty(addr));
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[async_trait::async_trait]
impl RegistryLookup for WhoisClient {
    async fn lookup(&self, ip: IpAddr, with_referral: bool) -> anyhow::Result<RegistryRecord> {
        let mut text = self.query(&self.server, ip).await?;

        if with_referral
            && let Some(referral) = find_referral(&text)
            && !same_server(&referral, &self.server)
        {
            debug!(%ip, %referral, "following whois referral");
            text = self.query(&referral, ip).await?;
        }

        let mut record = parse_response(&text);
        record.raw = Some(text);
        Ok(record)
    }
}

/// Registry that is never reachable; every address ends up with a guessed block.
pub struct OfflineRegistry;

#[async_trait::async_trait]
impl RegistryLookup for OfflineRegistry {
    async fn lookup(&self, ip: IpAddr, _with_referral: bool) -> anyhow::Result<RegistryRecord> {
        anyhow::bail!("registry lookups are disabled (asked for {ip})")
    }
}

fn query_for(server: &str, ip: IpAddr) -> String {
    if server.contains("arin.net") {
        format!("n + {ip}")
    } else {
        ip.to_string()
    }
}

fn with_port(server: &str) -> String {
    match server.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => server.to_string(),
        _ => format!("{server}:{WHOIS_PORT}"),
    }
}

fn same_server(a: &str, b: &str) -> bool {
    with_port(a).eq_ignore_ascii_case(&with_port(b))
}

fn split_field(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_ascii_lowercase(), value.trim()))
}

/// Finds the server a registry answer refers to, as `host[:port]`.
pub fn find_referral(text: &str) -> Option<String> {
    text.lines()
        .filter_map(split_field)
        .filter(|(key, _)| matches!(key.as_str(), "referralserver" | "refer" | "whois"))
        .find_map(|(_, value)| {
            let host = match value.split_once("://") {
                Some(("whois", rest)) => rest,
                Some(_) => return None,
                None => value,
            };
            let host = host.trim_end_matches('/');
            (!host.is_empty()).then(|| host.to_string())
        })
}

fn description_rank(key: &str) -> Option<u8> {
    match key {
        "orgname" | "custname" | "org-name" | "owner" => Some(0),
        "descr" => Some(1),
        "organization" => Some(2),
        "netname" => Some(3),
        _ => None,
    }
}

/// Prefix list for an `inetnum`/`inet6num`/`NetRange` value.
fn prefixes_of(value: &str) -> String {
    if value.contains('/') {
        return value.to_string();
    }
    match Ipv4Range::parse(value) {
        Some(range) => range.to_cidr_list(),
        None => value.to_string(),
    }
}

struct PendingNet {
    cidr: String,
    description: Option<(u8, String)>,
}

impl PendingNet {
    fn finish(self) -> RegistryNet {
        RegistryNet {
            cidr: self.cidr,
            description: self.description.map(|(_, d)| d),
        }
    }
}

/// Extracts the networks of a plain-text registry answer.
pub fn parse_response(text: &str) -> RegistryRecord {
    let mut nets: Vec<RegistryNet> = Vec::new();
    let mut current: Option<PendingNet> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        let Some((key, value)) = split_field(line) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "netrange" | "inetnum" | "inet6num" => {
                if let Some(done) = current.take() {
                    nets.push(done.finish());
                }
                current = Some(PendingNet {
                    cidr: prefixes_of(value),
                    description: None,
                });
            }
            "cidr" => {
                if let Some(net) = current.as_mut() {
                    net.cidr = value.to_string();
                }
            }
            other => {
                let (Some(net), Some(rank)) = (current.as_mut(), description_rank(other)) else {
                    continue;
                };
                let better = net
                    .description
                    .as_ref()
                    .is_none_or(|(held, _)| rank < *held);
                if better {
                    net.description = Some((rank, value.to_string()));
                }
            }
        }
    }

    if let Some(done) = current.take() {
        nets.push(done.finish());
    }

    RegistryRecord { nets, raw: None }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
