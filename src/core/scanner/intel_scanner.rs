// src/core/scanner/intel_scanner.rs

//! Threat intelligence providers that expose a subdomain listing over plain
//! HTTP GET: HackerTarget (CSV-ish text), ThreatCrowd and VirusTotal (JSON).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::models::MethodIdentifier;
use crate::core::scanner::{fetch_text, trim_base, SourceAdapter};
use crate::error::SourceError;

// --- HackerTarget ---

pub struct HackerTargetSource {
    client: Client,
    base_url: String,
}

impl HackerTargetSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl SourceAdapter for HackerTargetSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Hackertarget
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/hostsearch/", self.base_url);
        debug!(url = %url, domain, "Querying HackerTarget.");
        let request = self.client.get(&url).query(&[("q", domain)]).timeout(timeout);

        let body = fetch_text(request).await?;
        let hosts = parse_hackertarget(&body)?;
        info!(domain, hosts = hosts.len(), "HackerTarget lookup finished.");
        Ok(hosts)
    }
}

/// Parses the `host,ip` lines of a hostsearch answer.
///
/// The API reports quota and input problems as a 200 response with a plain
/// text message, so those bodies are turned into errors here.
pub(crate) fn parse_hackertarget(body: &str) -> Result<Vec<String>, SourceError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let first_line = body.lines().next().unwrap_or_default();
    let lowered = first_line.to_ascii_lowercase();
    if lowered.starts_with("error") || lowered.contains("api count exceeded") {
        return Err(SourceError::Parse(format!("HackerTarget: {first_line}")));
    }

    let hosts: Vec<String> = body
        .lines()
        .filter_map(|line| line.split_once(','))
        .map(|(host, _ip)| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .collect();

    if hosts.is_empty() {
        return Err(SourceError::Parse(format!(
            "HackerTarget: expected host,ip lines, got {first_line:?}"
        )));
    }
    Ok(hosts)
}

// --- ThreatCrowd ---

pub struct ThreatCrowdSource {
    client: Client,
    base_url: String,
}

impl ThreatCrowdSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl SourceAdapter for ThreatCrowdSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Threatcrowd
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/searchApi/v2/domain/report/", self.base_url);
        debug!(url = %url, domain, "Querying ThreatCrowd.");
        let request = self
            .client
            .get(&url)
            .query(&[("domain", domain)])
            .timeout(timeout);

        let body = fetch_text(request).await?;
        let hosts = parse_subdomain_listing("ThreatCrowd", &body)?;
        info!(domain, hosts = hosts.len(), "ThreatCrowd lookup finished.");
        Ok(hosts)
    }
}

// --- VirusTotal ---

pub struct VirusTotalSource {
    client: Client,
    base_url: String,
    apikey: String,
}

impl VirusTotalSource {
    pub fn new(client: Client, base_url: &str, apikey: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            apikey: apikey.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for VirusTotalSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Virustotal
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/vtapi/v2/domain/report", self.base_url);
        debug!(url = %url, domain, "Querying VirusTotal.");
        let request = self
            .client
            .get(&url)
            .query(&[("apikey", self.apikey.as_str()), ("domain", domain)])
            .timeout(timeout);

        let body = fetch_text(request).await?;
        let hosts = parse_subdomain_listing("VirusTotal", &body)?;
        info!(domain, hosts = hosts.len(), "VirusTotal lookup finished.");
        Ok(hosts)
    }
}

/// Reads the optional `subdomains` string array of a JSON report object.
///
/// A missing or null array means the provider knows nothing about the
/// domain; any other shape is a parse failure.
pub(crate) fn parse_subdomain_listing(provider: &str, body: &str) -> Result<Vec<String>, SourceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("{provider} returned malformed JSON: {e}")))?;
    let report = value
        .as_object()
        .ok_or_else(|| SourceError::Parse(format!("{provider}: expected a JSON object")))?;

    match report.get("subdomains") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Some(other) => Err(SourceError::Parse(format!(
            "{provider}: `subdomains` is not an array: {other}"
        ))),
    }
}
