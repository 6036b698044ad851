//! Scripted stand-ins for the outbound ports.
//!
//! Available to this crate's tests and, through the `test-utils` feature, to
//! the integration test suite.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use scopekeep_common::ports::dns::DnsResolver;
use scopekeep_common::ports::events::{EventKind, EventSink};
use scopekeep_common::ports::registry::{RegistryLookup, RegistryNet, RegistryRecord};

/// Registry answering from a script, recording every call.
#[derive(Default)]
pub struct ScriptedRegistry {
    answer: RegistryRecord,
    per_address: HashMap<IpAddr, RegistryRecord>,
    fail_referral: bool,
    fail_plain: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(IpAddr, bool)>>,
}

impl ScriptedRegistry {
    /// Answers every lookup with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a registry knowing one network.
    pub fn single(cidr: &str, description: &str) -> Self {
        Self::new().answer(RegistryRecord {
            nets: vec![RegistryNet::new(cidr, Some(description))],
            raw: Some(format!("CIDR: {cidr}\nOrgName: {description}")),
        })
    }

    pub fn answer(mut self, record: RegistryRecord) -> Self {
        self.answer = record;
        self
    }

    pub fn answer_for(mut self, ip: IpAddr, record: RegistryRecord) -> Self {
        self.per_address.insert(ip, record);
        self
    }

    pub fn fail_referral(mut self) -> Self {
        self.fail_referral = true;
        self
    }

    pub fn fail_plain(mut self) -> Self {
        self.fail_plain = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(IpAddr, bool)> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait::async_trait]
impl RegistryLookup for ScriptedRegistry {
    async fn lookup(&self, ip: IpAddr, with_referral: bool) -> anyhow::Result<RegistryRecord> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((ip, with_referral));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if (with_referral && self.fail_referral) || (!with_referral && self.fail_plain) {
            anyhow::bail!("scripted registry failure for {ip}");
        }

        Ok(self
            .per_address
            .get(&ip)
            .cloned()
            .unwrap_or_else(|| self.answer.clone()))
    }
}

/// Resolver answering from a fixed name table.
#[derive(Default)]
pub struct StaticResolver {
    names: HashMap<String, Vec<IpAddr>>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`; entries of `addrs` that do not parse are ignored.
    pub fn with(mut self, name: &str, addrs: &[&str]) -> Self {
        let parsed = addrs.iter().filter_map(|a| a.parse().ok()).collect();
        self.names.insert(name.to_string(), parsed);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl DnsResolver for StaticResolver {
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<IpAddr>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());

        if self.failing {
            anyhow::bail!("scripted resolver failure for {name}");
        }
        Ok(self.names.get(name).cloned().unwrap_or_default())
    }
}

/// Sink keeping every notification in memory.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<(EventKind, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(EventKind, String)> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn messages(&self, kind: EventKind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.messages(kind).len()
    }
}

impl EventSink for MemorySink {
    fn notify(&self, kind: EventKind, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, message.to_string()));
    }
}
