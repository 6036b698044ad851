use std::net::IpAddr;
use std::sync::Arc;

use scopekeep_common::config::Config;
use scopekeep_core::testing::{MemorySink, ScriptedRegistry, StaticResolver};
use scopekeep_core::{AssetClassifier, MemoryStore};

pub struct Harness {
    pub classifier: Arc<AssetClassifier>,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ScriptedRegistry>,
    pub sink: Arc<MemorySink>,
}

pub fn harness(registry: ScriptedRegistry, resolver: StaticResolver, cfg: Config) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(registry);
    let sink = Arc::new(MemorySink::new());
    let classifier = Arc::new(AssetClassifier::new(
        store.clone(),
        registry.clone(),
        Arc::new(resolver),
        sink.clone(),
        &cfg,
    ));

    Harness {
        classifier,
        store,
        registry,
        sink,
    }
}

pub fn ip(raw: &str) -> IpAddr {
    raw.parse().unwrap()
}
