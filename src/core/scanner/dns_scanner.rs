// src/core/scanner/dns_scanner.rs

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DnsConfig;
use crate::core::models::MethodIdentifier;
use crate::core::scanner::SourceAdapter;
use crate::error::SourceError;

/// Record types whose targets can name hosts of the domain.
const AUTHORITY_RECORD_TYPES: &[RecordType] = &[RecordType::NS, RecordType::MX, RecordType::SOA];

/// The resolver operations the DNS based sources need.
#[async_trait]
pub trait DnsProbe: Send + Sync {
    /// True when `name` resolves to at least one address (CNAMEs are followed).
    async fn resolves(&self, name: &str) -> bool;

    /// Host names referenced by the NS, MX and SOA records of `domain`.
    async fn authority_names(&self, domain: &str) -> Result<Vec<String>, SourceError>;
}

/// `DnsProbe` backed by a Tokio-based asynchronous hickory resolver.
pub struct HickoryProbe {
    resolver: TokioAsyncResolver,
}

impl HickoryProbe {
    pub fn new(config: &DnsConfig) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(config.lookup_timeout_ms);
        opts.attempts = config.attempts;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

#[async_trait]
impl DnsProbe for HickoryProbe {
    async fn resolves(&self, name: &str) -> bool {
        match self.resolver.lookup_ip(name).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                debug!(name, error = %e, "Name did not resolve.");
                false
            }
        }
    }

    async fn authority_names(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        let lookups = AUTHORITY_RECORD_TYPES
            .iter()
            .map(|record_type| self.resolver.lookup(domain, *record_type));
        let outcomes = futures::future::join_all(lookups).await;

        let mut names = Vec::new();
        let mut last_error = None;
        let mut answered = 0;

        for (record_type, outcome) in AUTHORITY_RECORD_TYPES.iter().zip(outcomes) {
            match outcome {
                Ok(lookup) => {
                    answered += 1;
                    for rdata in lookup.iter() {
                        let name = match rdata {
                            RData::NS(ns) => ns.0.to_utf8(),
                            RData::MX(mx) => mx.exchange().to_utf8(),
                            RData::SOA(soa) => soa.mname().to_utf8(),
                            RData::CNAME(cname) => cname.0.to_utf8(),
                            _ => continue,
                        };
                        names.push(name);
                    }
                }
                // An empty answer is still an answer.
                Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                    debug!(domain, record_type = %record_type, "No records of this type.");
                    answered += 1;
                }
                Err(e) => {
                    warn!(domain, record_type = %record_type, error = %e, "Record lookup failed.");
                    last_error = Some(e);
                }
            }
        }

        match (answered, last_error) {
            (0, Some(e)) => Err(SourceError::Network(format!("DNS Error: {e}"))),
            _ => Ok(names),
        }
    }
}

/// Brute-forces `<word>.<domain>` for every word of the list.
pub struct DnsWordlistSource {
    probe: Arc<dyn DnsProbe>,
    words: Vec<String>,
    concurrency: usize,
}

impl DnsWordlistSource {
    pub fn new(probe: Arc<dyn DnsProbe>, words: Vec<String>, concurrency: usize) -> Self {
        Self {
            probe,
            words,
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl SourceAdapter for DnsWordlistSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Dns
    }

    /// Lookups run at most `concurrency` at a time; results keep wordlist order.
    /// Running past `timeout` discards the partial results.
    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        info!(domain, words = self.words.len(), concurrency = self.concurrency, "Starting DNS wordlist probe.");

        let candidates: Vec<String> = self.words.iter().map(|word| format!("{word}.{domain}")).collect();
        let probe = Arc::clone(&self.probe);
        let lookups = stream::iter(candidates)
            .map(move |name| {
                let probe = Arc::clone(&probe);
                async move {
                    let resolved = probe.resolves(&name).await;
                    resolved.then_some(name)
                }
            })
            .buffered(self.concurrency)
            .collect::<Vec<Option<String>>>();

        let found: Vec<String> = tokio::time::timeout(timeout, lookups)
            .await
            .map_err(|_| {
                warn!(domain, timeout_ms = timeout.as_millis() as u64, "DNS wordlist probe timed out.");
                SourceError::Timeout
            })?
            .into_iter()
            .flatten()
            .collect();

        debug!(domain, found = found.len(), "DNS wordlist probe finished.");
        Ok(found)
    }
}

/// Collects the hosts named by the domain's own NS, MX and SOA records.
pub struct NsLookupSource {
    probe: Arc<dyn DnsProbe>,
}

impl NsLookupSource {
    pub fn new(probe: Arc<dyn DnsProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl SourceAdapter for NsLookupSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Nslookup
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        debug!(domain, "Looking up authority records.");
        tokio::time::timeout(timeout, self.probe.authority_names(domain))
            .await
            .map_err(|_| SourceError::Timeout)?
    }
}
