use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use colored::*;
use scopekeep_common::assets::{Address, Domain, IpVersion};
use scopekeep_common::ports::store::AssetStore;
use scopekeep_common::scope::Scope;
use scopekeep_core::{AssetClassifier, Observation};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

/// Stores the seed blocks, observes every target concurrently, then prints
/// what ended up in the inventory.
pub async fn classify(
    classifier: Arc<AssetClassifier>,
    scope: Scope,
    seeds: &[String],
    targets: &[String],
) -> anyhow::Result<()> {
    for block in seeds {
        classifier
            .observe_block(block, None, scope)
            .await
            .with_context(|| format!("storing scope block {block}"))?;
    }

    let mut tasks: JoinSet<()> = JoinSet::new();
    for target in targets {
        let classifier = classifier.clone();
        let target = target.clone();
        tasks.spawn(async move {
            match classifier.observe(&target, scope).await {
                Ok(observation) => debug!(%target, kind = kind_of(&observation), "observed"),
                Err(e) => warn!("Skipping {target}: {e}"),
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.context("classification task panicked")?;
    }

    print_inventory(classifier.store());
    Ok(())
}

fn kind_of(observation: &Observation) -> &'static str {
    match observation {
        Observation::Block(_) => "block",
        Observation::Address(_) => "address",
        Observation::Domain(_) => "domain",
    }
}

fn print_inventory(store: &dyn AssetStore) {
    let blocks = store.blocks();
    let base_domains = store.base_domains();

    if blocks.is_empty() && base_domains.is_empty() {
        print::header("empty inventory");
        print::nothing_stored();
        print::end_of_program();
        return;
    }

    print::header("network blocks");
    let addresses = store.addresses();
    for (idx, block) in blocks.iter().enumerate() {
        print::tree_head(idx, &block.key(), &block.org_name);
        let mut details: Vec<Detail> = vec![(String::from("scope"), print::scope_badge(block.scope))];
        details.extend(
            addresses
                .iter()
                .filter(|address| address.block == block.key())
                .map(|address| address_detail(address, store)),
        );
        print::as_tree_one_level(details);
    }

    let domains = store.domains();
    if !base_domains.is_empty() {
        print::header("domains");
        for (idx, base) in base_domains.iter().enumerate() {
            print::tree_head(idx, &base.name, &print::scope_badge(base.scope).to_string());
            let details: Vec<Detail> = domains
                .iter()
                .filter(|domain| domain.base == base.name)
                .map(domain_detail)
                .collect();
            print::as_tree_one_level(details);
        }
    }

    print::header("summary");
    print::aligned_line("blocks", blocks.len().to_string().color(colors::ACCENT));
    print::aligned_line("addresses", addresses.len().to_string().color(colors::ACCENT));
    print::aligned_line("domains", domains.len().to_string().color(colors::ACCENT));
    let in_scope = addresses.iter().filter(|address| !address.scope.is_none()).count();
    print::aligned_line("in scope", in_scope.to_string().color(colors::IN_SCOPE));
    print::end_of_program();
}

fn address_detail(address: &Address, store: &dyn AssetStore) -> Detail {
    let ip = match address.version {
        IpVersion::V4 => address.ip.to_string().color(colors::IPV4_ADDR),
        IpVersion::V6 => address.ip.to_string().color(colors::IPV6_ADDR),
    };
    let ports: Vec<String> = store
        .ports_of(address.ip)
        .iter()
        .map(|port| port.to_string())
        .collect();
    let ports = if ports.is_empty() {
        String::new()
    } else {
        format!("  [{}]", ports.join(", "))
    };

    (
        address.version.to_string(),
        format!("{}  {}{}", ip, print::scope_badge(address.scope), ports).normal(),
    )
}

fn domain_detail(domain: &Domain) -> Detail {
    let linked: Vec<String> = domain.addresses.iter().map(IpAddr::to_string).collect();
    let value = format!(
        "{}  {}  {}",
        domain.name.color(colors::PRIMARY),
        print::scope_badge(domain.scope),
        linked.join(", ").color(colors::SEPARATOR)
    );
    (String::from("domain"), value.normal())
}
