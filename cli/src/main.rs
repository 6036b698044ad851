mod commands;
mod terminal;

use std::sync::Arc;

use commands::{CommandLine, Commands, classify, lookup};
use scopekeep_common::config::Config;
use scopekeep_common::ports::dns::DnsResolver;
use scopekeep_common::ports::registry::RegistryLookup;
use scopekeep_common::scope::Scope;
use scopekeep_core::events::TracingSink;
use scopekeep_core::{AssetClassifier, MemoryStore};
use scopekeep_protocols::dns::{NoopResolver, SystemResolver, UdpDnsResolver};
use scopekeep_protocols::whois::{OfflineRegistry, WhoisClient};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    let cfg = commands.config();
    let classifier = Arc::new(build_classifier(&cfg));

    match commands.command {
        Commands::Classify {
            active,
            passive,
            scope,
            targets,
        } => {
            print::header("classifying targets");
            classify::classify(classifier, Scope::new(active, passive), &scope, &targets).await
        }
        Commands::Lookup { address } => {
            print::header("registry lookup");
            lookup::lookup(&classifier, &address).await
        }
    }
}

fn build_classifier(cfg: &Config) -> AssetClassifier {
    let registry: Arc<dyn RegistryLookup> = if cfg.no_whois {
        Arc::new(OfflineRegistry)
    } else {
        Arc::new(WhoisClient::from_config(cfg))
    };

    let dns: Arc<dyn DnsResolver> = match (cfg.no_dns, cfg.dns_server) {
        (true, _) => Arc::new(NoopResolver),
        (false, Some(server)) => Arc::new(UdpDnsResolver::new(server, cfg.dns_timeout)),
        (false, None) => Arc::new(SystemResolver::new(cfg.dns_timeout)),
    };

    AssetClassifier::new(
        Arc::new(MemoryStore::new()),
        registry,
        dns,
        Arc::new(TracingSink),
        cfg,
    )
}
