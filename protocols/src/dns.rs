//! # Forward DNS
//!
//! Three [`DnsResolver`] adapters:
//! * [`UdpDnsResolver`] asks one nameserver directly, A and AAAA in parallel.
//! * [`SystemResolver`] goes through the operating system (`getaddrinfo`),
//!   bounded by the same timeout.
//! * [`NoopResolver`] resolves nothing.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsType, DnsTypes, MutableDnsPacket, Opcode, Retcode};
use scopekeep_common::ports::dns::DnsResolver;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

pub const DNS_HDR_LEN: usize = 12;
pub const DNS_PORT: u16 = 53;

pub struct UdpDnsResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl UdpDnsResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    async fn query(&self, name: &str, qtype: DnsType) -> anyhow::Result<Vec<IpAddr>> {
        let bind: &str = if self.server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind).await.context("binding dns socket")?;
        socket
            .connect(self.server)
            .await
            .with_context(|| format!("connecting to nameserver {}", self.server))?;

        let id: u16 = rand::random();
        let packet = create_query_packet(name, qtype, id)?;
        socket.send(&packet).await.context("sending dns query")?;

        let deadline = Instant::now() + self.timeout;
        let mut buffer: Vec<u8> = vec![0u8; 4096];
        loop {
            let len = timeout_at(deadline, socket.recv(&mut buffer))
                .await
                .map_err(|_| anyhow::anyhow!("no answer from {} for {name}", self.server))?
                .context("receiving dns answer")?;

            match extract_addresses(&buffer[..len], id)? {
                Some(addrs) => return Ok(addrs),
                None => debug!(server = %self.server, "ignoring dns answer with foreign id"),
            }
        }
    }
}

#[async_trait::async_trait]
impl DnsResolver for UdpDnsResolver {
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<IpAddr>> {
        let (v4, v6) = tokio::join!(
            self.query(name, DnsTypes::A),
            self.query(name, DnsTypes::AAAA)
        );

        let mut resolved: Vec<IpAddr> = match (v4, v6) {
            (Err(e), Err(_)) => return Err(e),
            (v4, v6) => v4.unwrap_or_default().into_iter().chain(v6.unwrap_or_default()).collect(),
        };
        dedup_in_order(&mut resolved);
        debug!(name, count = resolved.len(), "resolved over udp");
        Ok(resolved)
    }
}

pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl DnsResolver for SystemResolver {
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<IpAddr>> {
        let lookup = tokio::net::lookup_host((name, 0));
        let mut resolved: Vec<IpAddr> = within(name, self.timeout, lookup)
            .await?
            .map(|sa| sa.ip())
            .collect();
        dedup_in_order(&mut resolved);
        Ok(resolved)
    }
}

pub struct NoopResolver;

#[async_trait::async_trait]
impl DnsResolver for NoopResolver {
    async fn resolve(&self, _name: &str) -> anyhow::Result<Vec<IpAddr>> {
        Ok(Vec::new())
    }
}

/// Bounds a system lookup, which would otherwise wait as long as the OS does.
async fn within<T>(
    name: &str,
    limit: Duration,
    lookup: impl Future<Output = std::io::Result<T>>,
) -> anyhow::Result<T> {
    tokio::time::timeout(limit, lookup)
        .await
        .map_err(|_| anyhow::anyhow!("resolving {name} timed out after {limit:?}"))?
        .with_context(|| format!("resolving {name}"))
}

fn dedup_in_order(addrs: &mut Vec<IpAddr>) {
    let mut seen = std::collections::HashSet::new();
    addrs.retain(|ip| seen.insert(*ip));
}

/// Builds a recursive single-question query for `name`.
pub fn create_query_packet(name: &str, qtype: DnsType, id: u16) -> anyhow::Result<Vec<u8>> {
    let qname: Vec<u8> = encode_dns_name(name)?;
    let total: usize = DNS_HDR_LEN + qname.len() + 4;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;
    buffer[cursor..cursor + qname.len()].copy_from_slice(&qname);
    cursor += qname.len();
    buffer[cursor..cursor + 2].copy_from_slice(&qtype.0.to_be_bytes());
    cursor += 2;
    buffer[cursor..cursor + 2].copy_from_slice(&DnsClass(1).0.to_be_bytes());

    Ok(buffer)
}

/// Addresses of an answer to query `expected_id`.
///
/// `None` when the packet answers some other query. A name that does not
/// exist yields an empty list, other error codes fail.
pub fn extract_addresses(data: &[u8], expected_id: u16) -> anyhow::Result<Option<Vec<IpAddr>>> {
    let packet = Packet::parse(data).context("failed to parse dns answer")?;
    if packet.header.id != expected_id || packet.header.query {
        return Ok(None);
    }

    match packet.header.response_code {
        ResponseCode::NoError => {}
        ResponseCode::NameError => return Ok(Some(Vec::new())),
        other => anyhow::bail!("nameserver answered {other:?}"),
    }

    let addrs = packet
        .answers
        .iter()
        .filter_map(|record| match &record.data {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect();
    Ok(Some(addrs))
}

fn encode_dns_name(name: &str) -> anyhow::Result<Vec<u8>> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        anyhow::ensure!(label.len() <= 63, "dns label too long in {name}");
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    Ok(encoded)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
