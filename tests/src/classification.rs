#![cfg(test)]
use scopekeep_common::config::{BaseDomainPolicy, Config};
use scopekeep_common::network::private::NON_PUBLIC_ORG;
use scopekeep_common::ports::events::EventKind;
use scopekeep_common::ports::registry::{RegistryNet, RegistryRecord};
use scopekeep_common::ports::store::AssetStore;
use scopekeep_common::scope::Scope;
use scopekeep_core::discovery::WHOIS_FAILED_ORG;
use scopekeep_core::testing::{ScriptedRegistry, StaticResolver};

use crate::harness::{harness, ip};

const ACTIVE: Scope = Scope {
    active: true,
    passive: false,
};

/// An address resolved by a new domain pulls the domain, and every other
/// address of that domain, into active scope.
#[tokio::test]
async fn domain_cascade_reaches_sibling_addresses() {
    let h = harness(
        ScriptedRegistry::single("93.184.216.0/24", "Edgecast"),
        StaticResolver::new().with("www.example.com", &["10.0.0.5", "93.184.216.34"]),
        Config::default(),
    );
    h.classifier
        .observe_block("10.0.0.0/24", Some("Corp LAN"), ACTIVE)
        .await
        .unwrap();

    let domain = h
        .classifier
        .observe_domain("www.example.com", Scope::NONE)
        .await
        .unwrap()
        .asset;

    assert_eq!(domain.scope, ACTIVE);
    assert_eq!(domain.addresses.len(), 2);
    assert_eq!(h.store.address(ip("10.0.0.5")).unwrap().scope, ACTIVE);

    let public = h.store.address(ip("93.184.216.34")).unwrap();
    assert_eq!(public.scope, ACTIVE);
    assert_eq!(public.block, "93.184.216.0/24");

    // Blocks are not part of the cascade.
    let block = h.store.block("93.184.216.0/24").unwrap();
    assert_eq!(block.org_name, "Edgecast");
    assert_eq!(block.scope, Scope::NONE);
}

#[tokio::test]
async fn narrowest_catalog_block_owns_the_address() {
    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), Config::default());
    h.classifier
        .observe_block("10.0.0.0/8", Some("Corp"), Scope::NONE)
        .await
        .unwrap();
    h.classifier
        .observe_block("10.1.0.0/16", Some("Lab"), ACTIVE)
        .await
        .unwrap();

    let inner = h.classifier.observe_address("10.1.2.3", Scope::NONE).await.unwrap().asset;
    assert_eq!(inner.block, "10.1.0.0/16");
    assert_eq!(inner.scope, ACTIVE);

    let outer = h.classifier.observe_address("10.2.0.1", ACTIVE).await.unwrap().asset;
    assert_eq!(outer.block, "10.0.0.0/8");
    assert_eq!(outer.scope, Scope::NONE);

    assert_eq!(h.store.blocks().len(), 2);
    assert_eq!(h.registry.call_count(), 0);
}

#[tokio::test]
async fn reserved_addresses_never_reach_the_registry() {
    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), Config::default());

    for (raw, block) in [
        ("127.0.0.1", "127.0.0.0/8"),
        ("192.168.1.10", "192.168.0.0/16"),
        ("169.254.1.1", "169.254.0.0/16"),
        ("fd00::1", "fc00::/7"),
        ("::1", "::1/128"),
    ] {
        let address = h.classifier.observe_address(raw, Scope::NONE).await.unwrap().asset;
        assert_eq!(address.block, block, "{raw}");
        assert_eq!(h.store.block(block).unwrap().org_name, NON_PUBLIC_ORG);
    }

    assert_eq!(h.registry.call_count(), 0);
}

#[tokio::test]
async fn registry_answer_picks_the_narrowest_network() {
    let registry = ScriptedRegistry::new().answer(RegistryRecord {
        nets: vec![
            RegistryNet::new("8.8.0.0/16", Some("desc B")),
            RegistryNet::new("8.8.8.0/24", Some("desc A")),
        ],
        raw: Some(String::from("NetRange: 8.8.8.0 - 8.8.8.255")),
    });
    let h = harness(registry, StaticResolver::new(), Config::default());

    let address = h.classifier.observe_address("8.8.8.8", Scope::NONE).await.unwrap().asset;
    assert_eq!(address.block, "8.8.8.0/24");
    assert_eq!(
        address.registry_text.as_deref(),
        Some("NetRange: 8.8.8.0 - 8.8.8.255")
    );
    assert_eq!(h.store.block("8.8.8.0/24").unwrap().org_name, "desc A");
    assert!(h.store.block("8.8.0.0/16").is_none());
}

#[tokio::test]
async fn unreachable_registry_falls_back_per_family() {
    let h = harness(
        ScriptedRegistry::new().fail_referral().fail_plain(),
        StaticResolver::new(),
        Config::default(),
    );

    let v4 = h.classifier.observe_address("93.184.216.34", Scope::NONE).await.unwrap().asset;
    let v6 = h
        .classifier
        .observe_address("2a00:1450:4001:80b::200e", Scope::NONE)
        .await
        .unwrap()
        .asset;

    assert_eq!(v4.block, "93.184.216.0/24");
    assert_eq!(v6.block, "2a00:1450:4001:80b::/64");
    for key in ["93.184.216.0/24", "2a00:1450:4001:80b::/64"] {
        assert_eq!(h.store.block(key).unwrap().org_name, WHOIS_FAILED_ORG);
    }

    // Each address: referral attempt, plain attempt.
    assert_eq!(h.registry.call_count(), 4);
    assert_eq!(h.sink.count(EventKind::Error), 2);
    assert_eq!(h.sink.count(EventKind::Warning), 2);
}

#[tokio::test]
async fn configurable_ipv6_fallback() {
    let cfg = Config {
        ipv6_fallback_prefix: 48,
        ..Config::default()
    };
    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), cfg);

    let address = h
        .classifier
        .observe_address("2a00:1450:4001:80b::200e", Scope::NONE)
        .await
        .unwrap()
        .asset;
    assert_eq!(address.block, "2a00:1450:4001::/48");
}

#[tokio::test]
async fn base_domain_policies() {
    for (policy, expected) in [
        (BaseDomainPolicy::Inherit, Scope::NONE),
        (BaseDomainPolicy::Merge, ACTIVE),
    ] {
        let cfg = Config {
            base_domain_policy: policy,
            ..Config::default()
        };
        let h = harness(ScriptedRegistry::new(), StaticResolver::new(), cfg);

        h.classifier.observe_domain("example.com", Scope::NONE).await.unwrap();
        let sub = h
            .classifier
            .observe_domain("api.example.com", ACTIVE)
            .await
            .unwrap()
            .asset;

        assert_eq!(sub.base, "example.com");
        assert_eq!(sub.scope, expected, "{policy:?}");
        assert_eq!(h.store.base_domain("example.com").unwrap().scope, expected, "{policy:?}");
        assert_eq!(h.store.base_domains().len(), 1);
    }
}

#[tokio::test]
async fn shared_address_joins_two_domains() {
    let h = harness(
        ScriptedRegistry::new(),
        StaticResolver::new()
            .with("a.example.com", &["10.0.0.1", "10.0.0.2"])
            .with("b.example.net", &["10.0.0.2", "10.0.0.3"]),
        Config::default(),
    );

    h.classifier.observe_domain("a.example.com", ACTIVE).await.unwrap();
    h.classifier
        .observe_domain("b.example.net", Scope::new(false, true))
        .await
        .unwrap();

    for name in ["a.example.com", "b.example.net"] {
        assert_eq!(h.store.domain(name).unwrap().scope, Scope::FULL, "{name}");
    }
    for raw in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        assert_eq!(h.store.address(ip(raw)).unwrap().scope, Scope::FULL, "{raw}");
    }
    assert_eq!(h.store.domains_linked_to(ip("10.0.0.2")).len(), 2);
}

#[tokio::test]
async fn ports_hang_off_observed_addresses() {
    use scopekeep_common::assets::Port;

    let h = harness(ScriptedRegistry::new(), StaticResolver::new(), Config::default());
    h.classifier
        .record_port(Port::new(ip("192.168.1.1"), 22, "tcp").with_service("ssh"))
        .await
        .unwrap();
    h.classifier
        .record_port(Port::new(ip("192.168.1.1"), 53, "udp").with_service("domain"))
        .await
        .unwrap();

    assert_eq!(h.store.addresses().len(), 1);
    let services: Vec<String> = h
        .store
        .ports_of(ip("192.168.1.1"))
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(services, vec!["tcp / 22 / ssh", "udp / 53 / domain"]);
}
