// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::core::normalizer;
use crate::error::{DiscoveryError, SourceError};

// --- Identificatori dei Metodi ---
// Method Identifiers

/// The closed set of discovery strategies. Each variant maps to exactly one
/// source adapter in the registry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MethodIdentifier {
    Dns,
    Crt,
    Hackertarget,
    Threatcrowd,
    Virustotal,
    Google,
    Bing,
    Nslookup,
}

impl MethodIdentifier {
    /// Comma separated list of every recognized method name.
    pub fn valid_names() -> String {
        Self::iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// --- Hostname ---

/// A hostname that passed normalization: lowercase, no scheme, no wildcard,
/// no trailing dot, and equal to (or under) the target domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedHostname(String);

impl NormalizedHostname {
    // Only the normalizer builds these.
    pub(crate) fn new_unchecked(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedHostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for NormalizedHostname {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// --- Richiesta ---
// Request

/// A validated discovery request: a canonical domain plus a non-empty,
/// duplicate-free list of methods in the order the caller gave them.
#[derive(Debug, Clone, PartialEq, Eq)]
///
/// Fields are private so every request goes through `new` or `parse`.
pub struct DiscoveryRequest {
    domain: String,
    methods: Vec<MethodIdentifier>,
}

impl DiscoveryRequest {
    pub fn new(domain: &str, methods: Vec<MethodIdentifier>) -> Result<Self, DiscoveryError> {
        let domain = normalizer::canonical_domain(domain)
            .ok_or_else(|| DiscoveryError::InvalidDomain(domain.to_string()))?;

        let mut seen = HashSet::new();
        let methods: Vec<MethodIdentifier> =
            methods.into_iter().filter(|m| seen.insert(*m)).collect();
        if methods.is_empty() {
            return Err(DiscoveryError::NoMethods);
        }

        Ok(Self { domain, methods })
    }

    /// Builds a request from raw method names, rejecting anything outside the
    /// closed `MethodIdentifier` enumeration.
    pub fn parse<I, S>(domain: &str, methods: I) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods = methods
            .into_iter()
            .map(|name| parse_method(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(domain, methods)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn methods(&self) -> &[MethodIdentifier] {
        &self.methods
    }
}

pub fn parse_method(name: &str) -> Result<MethodIdentifier, DiscoveryError> {
    name.trim()
        .parse::<MethodIdentifier>()
        .map_err(|_| DiscoveryError::UnknownMethod {
            name: name.to_string(),
            valid: MethodIdentifier::valid_names(),
        })
}

// --- Risultati per Metodo ---
// Per-method Results

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodStatus {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
}

/// Outcome of one adapter dispatch. Created `Pending` right before the
/// adapter runs and completed exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct MethodResult {
    pub method: MethodIdentifier,
    pub status: MethodStatus,
    pub hostnames: Vec<NormalizedHostname>,
    pub error: Option<String>,
}

impl MethodResult {
    pub fn pending(method: MethodIdentifier) -> Self {
        Self {
            method,
            status: MethodStatus::Pending,
            hostnames: Vec::new(),
            error: None,
        }
    }

    /// Moves a pending result into its terminal state.
    pub fn complete(self, outcome: Result<Vec<NormalizedHostname>, SourceError>) -> Self {
        debug_assert_eq!(self.status, MethodStatus::Pending);
        match outcome {
            Ok(hostnames) => Self {
                status: MethodStatus::Succeeded,
                hostnames,
                error: None,
                ..self
            },
            Err(SourceError::Timeout) => Self {
                status: MethodStatus::TimedOut,
                hostnames: Vec::new(),
                error: Some(SourceError::Timeout.to_string()),
                ..self
            },
            Err(e) => Self {
                status: MethodStatus::Failed,
                hostnames: Vec::new(),
                error: Some(e.to_string()),
                ..self
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != MethodStatus::Pending
    }
}

// --- Report Principale ---
// Main Report

/// The merged, per-method attributed result of one discovery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub domain: String,
    pub subdomains: Vec<NormalizedHostname>,
    pub total_found: usize,
    pub methods_used: Vec<MethodIdentifier>,
    pub results_by_method: BTreeMap<MethodIdentifier, Vec<NormalizedHostname>>,
    /// Diagnostic reason for every method that failed or timed out.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<MethodIdentifier, String>,
}

impl DiscoveryReport {
    /// Merges completed method results, in request order, into a report.
    ///
    /// `subdomains` keeps the first occurrence of every hostname: methods are
    /// visited in the order given and, within a method, in discovery order.
    pub fn from_results(domain: &str, results: Vec<MethodResult>) -> Self {
        let mut seen = HashSet::new();
        let mut subdomains = Vec::new();
        let mut methods_used = Vec::with_capacity(results.len());
        let mut results_by_method = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for result in results {
            methods_used.push(result.method);
            for host in &result.hostnames {
                if seen.insert(host.clone()) {
                    subdomains.push(host.clone());
                }
            }
            if let Some(reason) = result.error {
                errors.insert(result.method, reason);
            }
            results_by_method.insert(result.method, result.hostnames);
        }

        Self {
            domain: domain.to_string(),
            total_found: subdomains.len(),
            subdomains,
            methods_used,
            results_by_method,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(names: &[&str]) -> Vec<NormalizedHostname> {
        names
            .iter()
            .map(|n| NormalizedHostname::new_unchecked(n.to_string()))
            .collect()
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!(parse_method("CRT").unwrap(), MethodIdentifier::Crt);
        assert_eq!(parse_method(" nslookup ").unwrap(), MethodIdentifier::Nslookup);
        assert_eq!(MethodIdentifier::Hackertarget.to_string(), "hackertarget");
        assert!(matches!(
            parse_method("foo"),
            Err(DiscoveryError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn request_canonicalizes_domain_and_dedupes_methods() {
        let req = DiscoveryRequest::parse("Example.COM.", ["dns", "crt", "dns"]).unwrap();
        assert_eq!(req.domain(), "example.com");
        assert_eq!(req.methods(), [MethodIdentifier::Dns, MethodIdentifier::Crt]);
    }

    #[test]
    fn request_rejects_bad_input() {
        assert_eq!(
            DiscoveryRequest::parse("https://example.com/", ["dns"]),
            Err(DiscoveryError::InvalidDomain("https://example.com/".into()))
        );
        assert_eq!(
            DiscoveryRequest::new("example.com", vec![]),
            Err(DiscoveryError::NoMethods)
        );
        assert_eq!(
            DiscoveryRequest::parse("", ["dns"]),
            Err(DiscoveryError::InvalidDomain(String::new()))
        );
    }

    #[test]
    fn completion_sets_terminal_state() {
        let ok = MethodResult::pending(MethodIdentifier::Dns).complete(Ok(hosts(&["a.example.com"])));
        assert_eq!(ok.status, MethodStatus::Succeeded);
        assert!(ok.is_terminal());

        let timed_out = MethodResult::pending(MethodIdentifier::Crt).complete(Err(SourceError::Timeout));
        assert_eq!(timed_out.status, MethodStatus::TimedOut);
        assert_eq!(timed_out.error.as_deref(), Some("timeout"));

        let failed = MethodResult::pending(MethodIdentifier::Bing).complete(Err(SourceError::Status(503)));
        assert_eq!(failed.status, MethodStatus::Failed);
        assert!(failed.hostnames.is_empty());
    }

    #[test]
    fn report_merges_in_first_seen_order() {
        let results = vec![
            MethodResult::pending(MethodIdentifier::Dns)
                .complete(Ok(hosts(&["www.example.com", "mail.example.com"]))),
            MethodResult::pending(MethodIdentifier::Crt)
                .complete(Ok(hosts(&["api.example.com", "www.example.com"]))),
            MethodResult::pending(MethodIdentifier::Virustotal).complete(Err(SourceError::Status(403))),
        ];
        let report = DiscoveryReport::from_results("example.com", results);

        assert_eq!(
            report.subdomains,
            vec!["www.example.com", "mail.example.com", "api.example.com"]
        );
        assert_eq!(report.total_found, 3);
        assert_eq!(
            report.methods_used,
            vec![MethodIdentifier::Dns, MethodIdentifier::Crt, MethodIdentifier::Virustotal]
        );
        assert!(report.results_by_method[&MethodIdentifier::Virustotal].is_empty());
        assert_eq!(
            report.errors.get(&MethodIdentifier::Virustotal).map(String::as_str),
            Some("unexpected HTTP status 403")
        );
    }

    #[test]
    fn report_serializes_with_lowercase_method_keys() {
        let results = vec![
            MethodResult::pending(MethodIdentifier::Crt).complete(Ok(hosts(&["api.example.com"]))),
        ];
        let json = serde_json::to_value(DiscoveryReport::from_results("example.com", results)).unwrap();
        assert_eq!(json["methods_used"], serde_json::json!(["crt"]));
        assert_eq!(json["results_by_method"]["crt"], serde_json::json!(["api.example.com"]));
        assert_eq!(json["total_found"], 1);
        assert!(json.get("errors").is_none());
    }
}
