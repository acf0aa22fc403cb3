// src/core/mod.rs

/// Data structures shared across the crate: method identifiers, the
/// validated request, per-method results and the merged `DiscoveryReport`.
pub mod models;

/// Canonicalization and filtering of raw hostnames returned by the sources.
pub mod normalizer;

/// The source adapters, the method registry and the aggregator that runs
/// them concurrently.
pub mod scanner;

/// Static catalog describing every method and the recommended presets.
pub mod knowledge_base;
