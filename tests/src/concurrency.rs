#![cfg(test)]
use std::collections::HashSet;
use std::time::Duration;

use scopekeep_common::config::Config;
use scopekeep_common::ports::store::AssetStore;
use scopekeep_common::scope::Scope;
use scopekeep_core::testing::{ScriptedRegistry, StaticResolver};
use tokio::task::JoinSet;

use crate::harness::{harness, ip};

const WORKERS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn duplicate_domains_collapse_to_one_row() {
    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), Config::default());

    let mut tasks = JoinSet::new();
    for _ in 0..WORKERS {
        let classifier = h.classifier.clone();
        tasks.spawn(async move {
            classifier
                .observe_domain("WWW.Example.com", Scope::new(true, false))
                .await
                .unwrap()
        });
    }

    let mut created = 0;
    let mut views = HashSet::new();
    while let Some(joined) = tasks.join_next().await {
        let observed = joined.unwrap();
        created += usize::from(observed.created);
        views.insert((observed.asset.name, observed.asset.base, observed.asset.scope));
    }

    assert_eq!(created, 1);
    assert_eq!(views.len(), 1);
    assert_eq!(h.store.domains().len(), 1);
    assert_eq!(h.store.base_domains().len(), 1);
}

/// Callers racing on one domain with different flags all see the same row,
/// carrying the union of their flags and of the active address it resolves to.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn duplicate_domains_agree_on_merged_scope() {
    let h = harness(
        ScriptedRegistry::single("8.8.8.0/24", "Google LLC").delay(Duration::from_millis(200)),
        StaticResolver::new().with("www.example.com", &["10.0.0.1", "8.8.8.8"]),
        Config::default(),
    );
    h.classifier
        .observe_block("10.0.0.0/24", Some("Corp"), Scope::new(true, false))
        .await
        .unwrap();
    h.classifier.observe_address("10.0.0.1", Scope::NONE).await.unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..WORKERS {
        let classifier = h.classifier.clone();
        let scope = match i % 3 {
            0 => Scope::NONE,
            1 => Scope::new(false, true),
            _ => Scope::new(true, false),
        };
        tasks.spawn(async move {
            classifier
                .observe_domain("www.example.com", scope)
                .await
                .unwrap()
        });
    }

    let mut created = 0;
    let mut views = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let observed = joined.unwrap();
        created += usize::from(observed.created);
        views.push(observed.asset);
    }

    let stored = h.store.domain("www.example.com").unwrap();
    assert_eq!(created, 1);
    assert_eq!(stored.scope, Scope::FULL);
    assert_eq!(stored.addresses.len(), 2);
    for view in &views {
        assert_eq!(view.scope, stored.scope);
        assert_eq!(view.addresses, stored.addresses);
    }
    for raw in ["10.0.0.1", "8.8.8.8"] {
        assert_eq!(h.store.address(ip(raw)).unwrap().scope, Scope::FULL, "{raw}");
    }
    assert_eq!(h.store.domains().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn duplicate_addresses_share_one_discovered_block() {
    let h = harness(
        ScriptedRegistry::single("93.184.216.0/24", "Edgecast").delay(Duration::from_millis(50)),
        StaticResolver::new(),
        Config::default(),
    );

    let mut tasks = JoinSet::new();
    for _ in 0..WORKERS {
        let classifier = h.classifier.clone();
        tasks.spawn(async move {
            classifier
                .observe_address("93.184.216.34", Scope::NONE)
                .await
                .unwrap()
        });
    }

    let mut created = 0;
    while let Some(joined) = tasks.join_next().await {
        let observed = joined.unwrap();
        created += usize::from(observed.created);
        assert_eq!(observed.asset.block, "93.184.216.0/24");
    }

    assert_eq!(created, 1);
    assert_eq!(h.store.addresses().len(), 1);
    assert_eq!(h.store.blocks().len(), 1);
    assert_eq!(h.store.block("93.184.216.0/24").unwrap().org_name, "Edgecast");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_block_writers_keep_the_first_org() {
    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), Config::default());

    let mut tasks = JoinSet::new();
    for i in 0..WORKERS {
        let classifier = h.classifier.clone();
        tasks.spawn(async move {
            let org = format!("writer {i}");
            classifier
                .observe_block("198.51.100.0/24", Some(&org), Scope::NONE)
                .await
                .unwrap()
        });
    }

    let stored = loop {
        if let Some(block) = h.store.block("198.51.100.0/24") {
            break block;
        }
        tokio::task::yield_now().await;
    };

    let mut created = 0;
    while let Some(joined) = tasks.join_next().await {
        let observed = joined.unwrap();
        created += usize::from(observed.created);
        assert_eq!(observed.asset.org_name, stored.org_name);
    }
    assert_eq!(created, 1);
}

/// Two domains sharing an address, created at the same time with different
/// flags, always settle on the union of both.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_address_converges_regardless_of_order() {
    for _ in 0..25 {
        let h = harness(
            ScriptedRegistry::new(),
            StaticResolver::new()
                .with("a.example.com", &["10.0.0.1", "10.0.0.2"])
                .with("b.example.org", &["10.0.0.2", "10.0.0.3"]),
            Config::default(),
        );

        let a = {
            let classifier = h.classifier.clone();
            tokio::spawn(async move {
                classifier
                    .observe_domain("a.example.com", Scope::new(true, false))
                    .await
            })
        };
        let b = {
            let classifier = h.classifier.clone();
            tokio::spawn(async move {
                classifier
                    .observe_domain("b.example.org", Scope::new(false, true))
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        for name in ["a.example.com", "b.example.org"] {
            assert_eq!(h.store.domain(name).unwrap().scope, Scope::FULL, "{name}");
        }
        for raw in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert_eq!(h.store.address(ip(raw)).unwrap().scope, Scope::FULL, "{raw}");
        }
    }
}

/// A chain of domains linked through shared addresses; the ends carry the
/// only flags and every node must end up with both.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn chain_of_domains_converges() {
    const LINKS: usize = 12;

    let mut resolver = StaticResolver::new();
    for i in 0..LINKS {
        let left = format!("10.1.0.{i}");
        let right = format!("10.1.0.{}", i + 1);
        resolver = resolver.with(&format!("www.site{i}.com"), &[left.as_str(), right.as_str()]);
    }
    let h = harness(ScriptedRegistry::new(), resolver, Config::default());

    let mut tasks = JoinSet::new();
    for i in (0..LINKS).rev() {
        let classifier = h.classifier.clone();
        let scope = match i {
            0 => Scope::new(true, false),
            i if i == LINKS - 1 => Scope::new(false, true),
            _ => Scope::NONE,
        };
        tasks.spawn(async move {
            // Distinct base domains, so the base-domain policy stays out of it.
            let name = format!("www.site{i}.com");
            classifier.observe_domain(&name, scope).await.unwrap();
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    for domain in h.store.domains() {
        assert_eq!(domain.scope, Scope::FULL, "{}", domain.name);
    }
    for address in h.store.addresses() {
        assert_eq!(address.scope, Scope::FULL, "{}", address.ip);
    }
    assert_eq!(h.store.addresses().len(), LINKS + 1);
}
