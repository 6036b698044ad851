use colored::*;
use scopekeep_common::ports::validator::AddressValidator;
use scopekeep_core::AssetClassifier;
use scopekeep_core::discovery::Origin;
use scopekeep_core::validator::StdAddressValidator;

use crate::terminal::{colors, print};

pub async fn lookup(classifier: &AssetClassifier, raw: &str) -> anyhow::Result<()> {
    let ip = StdAddressValidator.validate(raw)?;
    let resolution = classifier.discovery().resolve(ip).await?;

    let origin = match resolution.origin {
        Origin::PrivateRange => "reserved range",
        Origin::Registry => "registry",
        Origin::Fallback => "guessed",
    };

    print::aligned_line("address", ip.to_string().color(colors::IPV4_ADDR));
    print::aligned_line("network", resolution.network.to_string().color(colors::ACCENT));
    print::aligned_line("org", resolution.org_name.color(colors::TEXT_DEFAULT));
    print::aligned_line("source", origin.color(colors::SEPARATOR));

    if let Some(text) = resolution.registry_text.as_deref() {
        print::header("registry answer");
        for line in text.lines().filter(|l| !l.trim().is_empty() && !l.starts_with(['#', '%'])) {
            print::print(line);
        }
    }

    print::end_of_program();
    Ok(())
}
