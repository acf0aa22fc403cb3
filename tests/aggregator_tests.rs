//! Aggregator and gateway behaviour against in-memory source adapters.
//!
//! None of these tests touch the network: every method is served by a
//! `MockSource` that returns canned candidates, fails, hangs or panics, and
//! counts how often it was called.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use subscout::{
    Aggregator, App, Config, DiscoveryError, DiscoveryRequest, MethodIdentifier, MethodRegistry,
    MethodStatus, SourceAdapter, SourceError,
};

#[derive(Clone)]
enum Behavior {
    Return(Vec<&'static str>),
    Delayed(Duration, Vec<&'static str>),
    Fail(SourceError),
    Hang,
    Panic,
}

struct MockSource {
    method: MethodIdentifier,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn method(&self) -> MethodIdentifier {
        self.method
    }

    async fn discover(&self, _domain: &str, _timeout: Duration) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(names) => Ok(owned(names)),
            Behavior::Delayed(delay, names) => {
                tokio::time::sleep(*delay).await;
                Ok(owned(names))
            }
            Behavior::Fail(e) => Err(e.clone()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Behavior::Panic => panic!("source exploded"),
        }
    }
}

/// Test harness: a registry of mock sources plus their call counters.
#[derive(Default)]
struct Harness {
    registry: MethodRegistry,
    calls: Vec<(MethodIdentifier, Arc<AtomicUsize>)>,
}

impl Harness {
    fn with(self, method: MethodIdentifier, behavior: Behavior) -> Self {
        self.with_timeout(method, behavior, Duration::from_secs(5))
    }

    fn with_timeout(mut self, method: MethodIdentifier, behavior: Behavior, timeout: Duration) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        self.registry.register(
            Arc::new(MockSource {
                method,
                behavior,
                calls: calls.clone(),
            }),
            timeout,
        );
        self.calls.push((method, calls));
        self
    }

    fn total_calls(&self) -> usize {
        self.calls.iter().map(|(_, c)| c.load(Ordering::SeqCst)).sum()
    }

    fn calls_for(&self, method: MethodIdentifier) -> usize {
        self.calls
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, c)| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

fn dns_and_crt() -> Harness {
    Harness::default()
        .with(
            MethodIdentifier::Dns,
            Behavior::Return(vec!["www.example.com", "mail.example.com"]),
        )
        .with(
            MethodIdentifier::Crt,
            Behavior::Return(vec!["api.example.com", "www.example.com", "*.example.com"]),
        )
}

#[tokio::test]
async fn dns_and_crt_scenario() {
    let harness = dns_and_crt();
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("example.com", ["dns", "crt"]).unwrap();

    let report = aggregator.run(&request).await.unwrap();

    assert_eq!(report.domain, "example.com");
    assert_eq!(
        report.subdomains,
        vec!["www.example.com", "mail.example.com", "api.example.com"]
    );
    assert_eq!(report.total_found, 3);
    assert_eq!(
        report.methods_used,
        vec![MethodIdentifier::Dns, MethodIdentifier::Crt]
    );
    assert_eq!(
        report.results_by_method[&MethodIdentifier::Dns],
        vec!["www.example.com", "mail.example.com"]
    );
    assert_eq!(
        report.results_by_method[&MethodIdentifier::Crt],
        vec!["api.example.com", "www.example.com"]
    );
    assert!(report.errors.is_empty());
    assert_eq!(harness.total_calls(), 2);
}

#[tokio::test]
async fn request_order_drives_first_seen_order() {
    let harness = dns_and_crt();
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("example.com", ["crt", "dns"]).unwrap();

    let report = aggregator.run(&request).await.unwrap();

    assert_eq!(
        report.subdomains,
        vec!["api.example.com", "www.example.com", "mail.example.com"]
    );
    assert_eq!(
        report.methods_used,
        vec![MethodIdentifier::Crt, MethodIdentifier::Dns]
    );
}

#[tokio::test]
async fn unknown_method_is_rejected_before_dispatch() {
    let harness = dns_and_crt();
    let app = App::with_registry(Config::default(), harness.registry.clone());

    let err = app.discover("example.com", &["dns", "foo"]).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::UnknownMethod { ref name, .. } if name == "foo"));
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn unregistered_method_is_rejected_before_dispatch() {
    let harness = Harness::default().with(
        MethodIdentifier::Dns,
        Behavior::Return(vec!["www.example.com"]),
    );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("example.com", ["dns", "virustotal"]).unwrap();

    let err = aggregator.run(&request).await.unwrap_err();

    assert_eq!(err, DiscoveryError::UnsupportedMethod("virustotal".into()));
    assert_eq!(harness.calls_for(MethodIdentifier::Dns), 0);
}

#[tokio::test]
async fn invalid_domain_is_rejected_before_dispatch() {
    let harness = dns_and_crt();
    let app = App::with_registry(Config::default(), harness.registry.clone());

    let err = app.discover("not a domain", &["dns"]).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::InvalidDomain(_)));
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn failures_are_isolated() {
    let harness = Harness::default()
        .with(
            MethodIdentifier::Dns,
            Behavior::Return(vec!["www.example.com"]),
        )
        .with(
            MethodIdentifier::Hackertarget,
            Behavior::Fail(SourceError::Status(429)),
        )
        .with_timeout(MethodIdentifier::Crt, Behavior::Hang, Duration::from_millis(50))
        .with(MethodIdentifier::Bing, Behavior::Panic)
        .with(
            MethodIdentifier::Virustotal,
            Behavior::Return(vec!["vpn.example.com"]),
        );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse(
        "example.com",
        ["dns", "hackertarget", "crt", "bing", "virustotal"],
    )
    .unwrap();

    let report = aggregator.run(&request).await.unwrap();

    assert_eq!(report.subdomains, vec!["www.example.com", "vpn.example.com"]);
    assert_eq!(report.methods_used.len(), 5);
    assert!(report.results_by_method[&MethodIdentifier::Crt].is_empty());
    assert!(report.results_by_method[&MethodIdentifier::Bing].is_empty());
    assert_eq!(
        report.errors.get(&MethodIdentifier::Crt).map(String::as_str),
        Some("timeout")
    );
    assert_eq!(
        report.errors.get(&MethodIdentifier::Hackertarget).map(String::as_str),
        Some("unexpected HTTP status 429")
    );
    assert!(report.errors[&MethodIdentifier::Bing].starts_with("adapter task aborted"));
    assert!(!report.errors.contains_key(&MethodIdentifier::Dns));
    assert_eq!(harness.total_calls(), 5);
}

#[tokio::test]
async fn all_sources_failing_still_yields_a_report() {
    let harness = Harness::default()
        .with(
            MethodIdentifier::Dns,
            Behavior::Fail(SourceError::Network("refused".into())),
        )
        .with_timeout(MethodIdentifier::Crt, Behavior::Hang, Duration::from_millis(20))
        .with(
            MethodIdentifier::Threatcrowd,
            Behavior::Fail(SourceError::Parse("not json".into())),
        );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request =
        DiscoveryRequest::parse("example.com", ["dns", "crt", "threatcrowd"]).unwrap();

    let report = aggregator.run(&request).await.unwrap();

    assert!(report.subdomains.is_empty());
    assert_eq!(report.total_found, 0);
    assert_eq!(
        report.methods_used,
        vec![
            MethodIdentifier::Dns,
            MethodIdentifier::Crt,
            MethodIdentifier::Threatcrowd
        ]
    );
    assert_eq!(report.results_by_method.len(), 3);
    assert!(report.results_by_method.values().all(Vec::is_empty));
    assert_eq!(report.errors.len(), 3);
}

#[tokio::test]
async fn identical_source_output_gives_identical_reports() {
    let harness = Harness::default()
        .with(
            MethodIdentifier::Dns,
            Behavior::Delayed(
                Duration::from_millis(30),
                vec!["b.example.com", "a.example.com"],
            ),
        )
        .with(
            MethodIdentifier::Crt,
            Behavior::Return(vec!["c.example.com", "a.example.com", "B.example.com."]),
        )
        .with(
            MethodIdentifier::Google,
            Behavior::Delayed(Duration::from_millis(5), vec!["d.example.com"]),
        );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("example.com", ["dns", "crt", "google"]).unwrap();

    let first = aggregator.run(&request).await.unwrap();
    let second = aggregator.run(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.subdomains,
        vec!["b.example.com", "a.example.com", "c.example.com", "d.example.com"]
    );
}

#[tokio::test]
async fn report_invariants_hold_for_noisy_sources() {
    let harness = Harness::default()
        .with(
            MethodIdentifier::Crt,
            Behavior::Return(vec![
                "API.example.com",
                "https://api.example.com",
                "*.example.com",
                "example.com",
                "example.org",
                "notexample.com",
                "bad_name.example.com",
                "deep.dev.example.com.",
            ]),
        )
        .with(
            MethodIdentifier::Threatcrowd,
            Behavior::Return(vec!["  dev.example.com ", "evil.com", "api.example.com"]),
        );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("Example.com", ["crt", "threatcrowd"]).unwrap();

    let report = aggregator.run(&request).await.unwrap();

    assert_eq!(report.domain, "example.com");
    assert_eq!(
        report.subdomains,
        vec!["api.example.com", "example.com", "deep.dev.example.com", "dev.example.com"]
    );
    assert_eq!(report.total_found, report.subdomains.len());

    let mut unique = report.subdomains.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), report.subdomains.len());

    for host in &report.subdomains {
        let host = host.as_str();
        assert!(host == "example.com" || host.ends_with(".example.com"), "{host}");
    }
    for method in &report.methods_used {
        for host in &report.results_by_method[method] {
            assert!(report.subdomains.contains(host));
        }
    }
}

#[tokio::test]
async fn sources_run_concurrently() {
    let delay = Duration::from_millis(200);
    let harness = Harness::default()
        .with(MethodIdentifier::Dns, Behavior::Delayed(delay, vec!["a.example.com"]))
        .with(MethodIdentifier::Crt, Behavior::Delayed(delay, vec!["b.example.com"]))
        .with(MethodIdentifier::Bing, Behavior::Delayed(delay, vec!["c.example.com"]));
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::parse("example.com", ["dns", "crt", "bing"]).unwrap();

    let started = Instant::now();
    let report = aggregator.run(&request).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.total_found, 3);
    assert!(elapsed < delay * 2, "sources were serialized: {elapsed:?}");
}

#[tokio::test]
async fn gateway_expands_presets_and_defaults() {
    let harness = Harness::default()
        .with(MethodIdentifier::Dns, Behavior::Return(vec![]))
        .with(MethodIdentifier::Crt, Behavior::Return(vec![]))
        .with(MethodIdentifier::Hackertarget, Behavior::Return(vec![]))
        .with(MethodIdentifier::Threatcrowd, Behavior::Return(vec![]));
    let app = App::with_registry(Config::default(), harness.registry.clone());

    let none: [&str; 0] = [];
    let defaults = app.build_request("example.com", &none).unwrap();
    assert_eq!(defaults.methods(), [MethodIdentifier::Dns, MethodIdentifier::Crt]);

    let preset = app.build_request("example.com", &["comprehensive"]).unwrap();
    assert_eq!(preset.methods().len(), 4);

    let listed = app
        .build_request("example.com", &["crt,hackertarget", "CRT"])
        .unwrap();
    assert_eq!(
        listed.methods(),
        [MethodIdentifier::Crt, MethodIdentifier::Hackertarget]
    );

    assert_eq!(
        app.build_request("example.com", &["google"]),
        Err(DiscoveryError::UnsupportedMethod("google".into()))
    );
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn method_results_reach_terminal_states() {
    use subscout::MethodResult;

    let pending = MethodResult::pending(MethodIdentifier::Dns);
    assert_eq!(pending.status, MethodStatus::Pending);
    assert!(!pending.is_terminal());

    let done = pending.complete(Err(SourceError::Timeout));
    assert_eq!(done.status, MethodStatus::TimedOut);
    assert!(done.is_terminal());
}

/// Counts adapters that started and adapters that ran to completion.
struct SlowSource {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceAdapter for SlowSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Threatcrowd
    }

    async fn discover(&self, _domain: &str, _timeout: Duration) -> Result<Vec<String>, SourceError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(owned(&["late.example.com"]))
    }
}

#[tokio::test]
async fn dropping_a_run_aborts_its_sources() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let mut registry = MethodRegistry::new();
    registry.register(
        Arc::new(SlowSource {
            started: started.clone(),
            finished: finished.clone(),
        }),
        Duration::from_secs(5),
    );
    let aggregator = Aggregator::new(registry);
    let request = DiscoveryRequest::parse("example.com", ["threatcrowd"]).unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(50), aggregator.run(&request)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_matches_candidates_against_the_canonical_domain() {
    let harness = Harness::default().with(
        MethodIdentifier::Crt,
        Behavior::Return(vec!["API.Example.com.", "www.example.com"]),
    );
    let aggregator = Aggregator::new(harness.registry.clone());
    let request = DiscoveryRequest::new("Example.COM.", vec![MethodIdentifier::Crt]).unwrap();
    assert_eq!(request.domain(), "example.com");

    let report = aggregator.run(&request).await.unwrap();

    assert_eq!(report.domain, "example.com");
    assert_eq!(report.subdomains, vec!["api.example.com", "www.example.com"]);
}
