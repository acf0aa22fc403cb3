// src/core/scanner/mod.rs

// This file is the public interface of the `scanner` module: the adapter
// trait every discovery source implements, the registry that maps method
// identifiers to adapters, and the aggregator that fans a request out.
pub mod crt_scanner;
pub mod dns_scanner;
pub mod intel_scanner;
pub mod search_scanner;

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{Config, HttpConfig};
use crate::core::models::{DiscoveryReport, DiscoveryRequest, MethodIdentifier, MethodResult};
use crate::core::normalizer;
use crate::error::{ConfigError, DiscoveryError, SourceError};

use self::crt_scanner::CrtShSource;
use self::dns_scanner::{DnsWordlistSource, HickoryProbe, NsLookupSource};
use self::intel_scanner::{HackerTargetSource, ThreatCrowdSource, VirusTotalSource};
use self::search_scanner::{SearchEngine, SearchEngineSource};

/// One discovery strategy.
///
/// Implementations return raw, uncleaned candidates; the aggregator runs
/// them through the normalizer. Every failure must come back as a
/// `SourceError` rather than a panic.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn method(&self) -> MethodIdentifier;

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError>;
}

/// An adapter together with its timeout budget.
#[derive(Clone)]
pub struct RegisteredSource {
    pub adapter: Arc<dyn SourceAdapter>,
    pub timeout: Duration,
}

/// Static mapping from method identifier to adapter, built once at startup.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    sources: HashMap<MethodIdentifier, RegisteredSource>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under its own method identifier, replacing any
    /// adapter previously registered for it.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>, timeout: Duration) {
        let method = adapter.method();
        debug!(method = %method, timeout_ms = timeout.as_millis() as u64, "Registering source adapter.");
        self.sources.insert(method, RegisteredSource { adapter, timeout });
    }

    pub fn get(&self, method: MethodIdentifier) -> Option<&RegisteredSource> {
        self.sources.get(&method)
    }

    pub fn contains(&self, method: MethodIdentifier) -> bool {
        self.sources.contains_key(&method)
    }

    /// Registered methods in enumeration order.
    pub fn methods(&self) -> Vec<MethodIdentifier> {
        let mut methods: Vec<_> = self.sources.keys().copied().collect();
        methods.sort();
        methods
    }

    /// Builds the production adapters for every method enabled in `config`.
    ///
    /// HTTP adapters share one `reqwest::Client`; the DNS adapters share one resolver.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = build_http_client(&config.http)
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;
        let probe = Arc::new(HickoryProbe::new(&config.dns));
        let endpoints = &config.endpoints;

        let mut registry = Self::new();
        for method in &config.enabled_methods {
            let adapter: Arc<dyn SourceAdapter> = match method {
                MethodIdentifier::Dns => Arc::new(DnsWordlistSource::new(
                    probe.clone(),
                    config.dns.words.clone(),
                    config.dns.concurrency,
                )),
                MethodIdentifier::Nslookup => Arc::new(NsLookupSource::new(probe.clone())),
                MethodIdentifier::Crt => Arc::new(CrtShSource::new(client.clone(), &endpoints.crt)),
                MethodIdentifier::Hackertarget => {
                    Arc::new(HackerTargetSource::new(client.clone(), &endpoints.hackertarget))
                }
                MethodIdentifier::Threatcrowd => {
                    Arc::new(ThreatCrowdSource::new(client.clone(), &endpoints.threatcrowd))
                }
                MethodIdentifier::Virustotal => Arc::new(VirusTotalSource::new(
                    client.clone(),
                    &endpoints.virustotal,
                    &config.http.virustotal_apikey,
                )),
                MethodIdentifier::Google => Arc::new(SearchEngineSource::new(
                    SearchEngine::Google,
                    client.clone(),
                    &endpoints.google,
                )),
                MethodIdentifier::Bing => Arc::new(SearchEngineSource::new(
                    SearchEngine::Bing,
                    client.clone(),
                    &endpoints.bing,
                )),
            };
            registry.register(adapter, config.timeouts.for_method(*method));
        }

        info!(methods = ?registry.methods(), "Method registry ready.");
        Ok(registry)
    }
}

/// Fans one request out to its sources and merges what comes back.
#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<MethodRegistry>,
}

impl Aggregator {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry: Arc::new(registry) }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Runs every requested method concurrently and builds the report.
    ///
    /// Each adapter runs in its own task under its own timeout and the call
    /// waits for all of them. Adapter failures only empty that method's
    /// entry; the sole error is a method with no registered adapter, which
    /// is detected before anything is dispatched. The tasks live in a
    /// `JoinSet`, so dropping the returned future aborts the ones still running.
    pub async fn run(&self, request: &DiscoveryRequest) -> Result<DiscoveryReport, DiscoveryError> {
        let resolved = request
            .methods()
            .iter()
            .map(|method| {
                self.registry
                    .get(*method)
                    .cloned()
                    .map(|source| (*method, source))
                    .ok_or_else(|| DiscoveryError::UnsupportedMethod(method.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let domain = request.domain();
        info!(domain = %domain, methods = ?request.methods(), "Starting subdomain discovery.");

        let mut pending = Vec::with_capacity(resolved.len());
        let mut tasks = JoinSet::new();
        for (index, (method, source)) in resolved.into_iter().enumerate() {
            pending.push(MethodResult::pending(method));
            let domain = domain.to_string();
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(dispatch(source, domain))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        let reason = panic_message(payload.as_ref());
                        error!(method = %method, panic = %reason, "Source task panicked!");
                        Err(SourceError::Aborted(reason))
                    });
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Result<Vec<String>, SourceError>>> =
            (0..pending.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!(error = %e, "Source task could not be joined."),
            }
        }

        let results = pending
            .into_iter()
            .zip(outcomes)
            .map(|(pending, outcome)| {
                let method = pending.method;
                let outcome = outcome
                    .unwrap_or_else(|| Err(SourceError::Aborted("task cancelled".to_string())))
                    .map(|raw| {
                        let accepted = normalizer::normalize_all(&raw, domain);
                        debug!(method = %method, raw = raw.len(), accepted = accepted.len(), "Normalized candidates.");
                        accepted
                    });
                pending.complete(outcome)
            })
            .collect();

        let report = DiscoveryReport::from_results(domain, results);
        info!(
            domain = %report.domain,
            total = report.total_found,
            failed = report.errors.len(),
            "Subdomain discovery finished."
        );
        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs one adapter under its timeout budget.
async fn dispatch(source: RegisteredSource, domain: String) -> Result<Vec<String>, SourceError> {
    let method = source.adapter.method();
    let started = Instant::now();
    debug!(method = %method, domain = %domain, "Dispatching source.");

    let outcome = tokio::time::timeout(source.timeout, source.adapter.discover(&domain, source.timeout))
        .await
        .unwrap_or(Err(SourceError::Timeout));

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(raw) => info!(method = %method, candidates = raw.len(), elapsed_ms, "Source finished."),
        Err(e) => warn!(method = %method, error = %e, elapsed_ms, "Source failed."),
    }
    outcome
}

pub fn build_http_client(config: &HttpConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
}

/// Sends the request and returns the body of a 2xx response.
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
