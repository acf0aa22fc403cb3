// src/app.rs

//! The request gateway: turns loosely typed input (a domain string and
//! method or preset names) into a `DiscoveryRequest`, checks it against the
//! methods this deployment enabled, and hands it to the aggregator.

use tracing::debug;

use crate::config::Config;
use crate::core::knowledge_base;
use crate::core::models::{parse_method, DiscoveryReport, DiscoveryRequest, MethodIdentifier};
use crate::core::scanner::{Aggregator, MethodRegistry};
use crate::error::{ConfigError, DiscoveryError};

pub struct App {
    config: Config,
    aggregator: Aggregator,
}

impl App {
    /// Builds the production registry from `config`.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let registry = MethodRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    pub fn with_registry(config: Config, registry: MethodRegistry) -> Self {
        Self {
            config,
            aggregator: Aggregator::new(registry),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Methods a request may name in this deployment.
    pub fn available_methods(&self) -> Vec<MethodIdentifier> {
        self.aggregator.registry().methods()
    }

    /// Validates raw input into a request.
    ///
    /// Each entry may be a method name, a comma separated list of them, or a
    /// preset name. No entries means the configured default methods.
    pub fn build_request<S: AsRef<str>>(
        &self,
        domain: &str,
        methods: &[S],
    ) -> Result<DiscoveryRequest, DiscoveryError> {
        let mut selected = Vec::new();
        for entry in methods {
            for name in entry.as_ref().split(',').map(str::trim).filter(|n| !n.is_empty()) {
                match knowledge_base::get_preset(name) {
                    Some(preset) => selected.extend_from_slice(preset.methods),
                    None => selected.push(parse_method(name)?),
                }
            }
        }
        if selected.is_empty() {
            debug!(defaults = ?self.config.default_methods, "No methods given, using defaults.");
            selected = self.config.default_methods.clone();
        }

        if let Some(disabled) = selected
            .iter()
            .find(|m| !self.aggregator.registry().contains(**m))
        {
            return Err(DiscoveryError::UnsupportedMethod(disabled.to_string()));
        }

        DiscoveryRequest::new(domain, selected)
    }

    pub async fn discover<S: AsRef<str>>(
        &self,
        domain: &str,
        methods: &[S],
    ) -> Result<DiscoveryReport, DiscoveryError> {
        let request = self.build_request(domain, methods)?;
        self.aggregator.run(&request).await
    }
}
