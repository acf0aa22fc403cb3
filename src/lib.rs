// src/lib.rs

//! Concurrent subdomain discovery: one domain is fanned out to DNS probing,
//! Certificate Transparency, threat intelligence APIs and search engines,
//! and the answers are merged into a single per-method attributed report.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use app::App;
pub use config::Config;
pub use core::models::{DiscoveryReport, DiscoveryRequest, MethodIdentifier, MethodResult, MethodStatus};
pub use core::scanner::{Aggregator, MethodRegistry, SourceAdapter};
pub use error::{ConfigError, DiscoveryError, SourceError};
