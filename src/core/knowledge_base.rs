//! Static catalog of the discovery methods: what each one does, whether it
//! depends on a third-party service, and the recommended method presets.
//! The gateway uses it to answer "which methods exist" and to expand preset
//! names into method lists.

use serde::Serialize;
use std::fmt;

use crate::core::models::MethodIdentifier;

/// How a method obtains its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodCategory {
    /// Queries DNS directly through the local resolver.
    ActiveDns,
    /// Reads a public certificate or threat intelligence dataset.
    PassiveIntel,
    /// Scrapes a search engine results page.
    SearchEngine,
}

impl fmt::Display for MethodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodCategory::ActiveDns => write!(f, "Active DNS"),
            MethodCategory::PassiveIntel => write!(f, "Passive Intelligence"),
            MethodCategory::SearchEngine => write!(f, "Search Engine"),
        }
    }
}

/// Human-readable information about one discovery method.
#[derive(Debug, Serialize)]
pub struct MethodDetail {
    pub method: MethodIdentifier,
    pub title: &'static str,
    pub category: MethodCategory,
    /// Whether the method sends the domain to a third party.
    pub third_party: bool,
    pub description: &'static str,
}

static METHODS: &[MethodDetail] = &[
    MethodDetail {
        method: MethodIdentifier::Dns,
        title: "DNS Wordlist",
        category: MethodCategory::ActiveDns,
        third_party: false,
        description: "DNS enumeration using a common subdomain wordlist (fast, reliable).",
    },
    MethodDetail {
        method: MethodIdentifier::Crt,
        title: "Certificate Transparency",
        category: MethodCategory::PassiveIntel,
        third_party: true,
        description: "Certificate Transparency logs via crt.sh (most comprehensive).",
    },
    MethodDetail {
        method: MethodIdentifier::Hackertarget,
        title: "HackerTarget",
        category: MethodCategory::PassiveIntel,
        third_party: true,
        description: "HackerTarget host search API (good coverage, free, rate limited).",
    },
    MethodDetail {
        method: MethodIdentifier::Threatcrowd,
        title: "ThreatCrowd",
        category: MethodCategory::PassiveIntel,
        third_party: true,
        description: "ThreatCrowd domain report API (threat intelligence data).",
    },
    MethodDetail {
        method: MethodIdentifier::Virustotal,
        title: "VirusTotal",
        category: MethodCategory::PassiveIntel,
        third_party: true,
        description: "VirusTotal domain report API (security-focused results).",
    },
    MethodDetail {
        method: MethodIdentifier::Google,
        title: "Google Search",
        category: MethodCategory::SearchEngine,
        third_party: true,
        description: "Hosts linked or mentioned on a Google `site:` results page.",
    },
    MethodDetail {
        method: MethodIdentifier::Bing,
        title: "Bing Search",
        category: MethodCategory::SearchEngine,
        third_party: true,
        description: "Hosts linked or mentioned on a Bing `site:` results page.",
    },
    MethodDetail {
        method: MethodIdentifier::Nslookup,
        title: "Authority Records",
        category: MethodCategory::ActiveDns,
        third_party: false,
        description: "Name servers, mail exchangers and SOA primary named by the domain's own records.",
    },
];

/// A named, recommended list of methods.
#[derive(Debug, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub methods: &'static [MethodIdentifier],
}

static PRESETS: &[Preset] = &[
    Preset {
        name: "fast",
        methods: &[MethodIdentifier::Dns, MethodIdentifier::Crt],
    },
    Preset {
        name: "comprehensive",
        methods: &[
            MethodIdentifier::Dns,
            MethodIdentifier::Crt,
            MethodIdentifier::Hackertarget,
            MethodIdentifier::Threatcrowd,
        ],
    },
    Preset {
        name: "best_single",
        methods: &[MethodIdentifier::Crt],
    },
];

pub fn all_methods() -> &'static [MethodDetail] {
    METHODS
}

pub fn get_method_detail(method: MethodIdentifier) -> Option<&'static MethodDetail> {
    METHODS.iter().find(|m| m.method == method)
}

pub fn presets() -> &'static [Preset] {
    PRESETS
}

/// Looks up a preset by name, ignoring ASCII case.
pub fn get_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_method_is_documented_once() {
        for method in MethodIdentifier::iter() {
            let count = METHODS.iter().filter(|m| m.method == method).count();
            assert_eq!(count, 1, "{method} should have exactly one catalog entry");
        }
    }

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(
            get_preset("FAST").map(|p| p.methods),
            Some(&[MethodIdentifier::Dns, MethodIdentifier::Crt][..])
        );
        assert_eq!(get_preset("best_single").unwrap().methods, &[MethodIdentifier::Crt]);
        assert!(get_preset("dns").is_none());
    }

    #[test]
    fn dns_methods_are_not_third_party() {
        assert!(!get_method_detail(MethodIdentifier::Dns).unwrap().third_party);
        assert!(get_method_detail(MethodIdentifier::Crt).unwrap().third_party);
    }
}
