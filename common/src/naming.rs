//! # Domain Names
//!
//! Canonical form of domain names and the base-domain heuristic.
//!
//! The base domain is simply the last two labels. This is not a public suffix
//! lookup: `foo.example.co.uk` groups under `co.uk`.

use std::fmt;

use crate::error::AssetError;

const ALLOWED: &str = "abcdefghijklmnopqrstuvwxyz0123456789.-";

/// Lowercases `raw` and drops every character outside `[a-z0-9.-]`.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| ALLOWED.contains(*c))
        .collect()
}

/// Returns the last two dot-separated labels of an already normalized name.
pub fn base_domain_of(name: &str) -> Result<String, AssetError> {
    if !name.contains('.') {
        return Err(AssetError::InvalidDomain(name.to_string()));
    }
    let labels: Vec<&str> = name.rsplitn(3, '.').collect();
    Ok(format!("{}.{}", labels[1], labels[0]))
}

/// A normalized domain name together with its base domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName {
    name: String,
    base: String,
}

impl DomainName {
    pub fn parse(raw: &str) -> Result<Self, AssetError> {
        let name = normalize(raw);
        let base = base_domain_of(&name)?;
        Ok(Self { name, base })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
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
