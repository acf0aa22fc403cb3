// src/error.rs

use thiserror::Error;

/// Errors that reject a discovery request before any source is contacted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Invalid domain format: {0:?}")]
    InvalidDomain(String),

    #[error("Invalid method: {name}. Valid methods: {valid}")]
    UnknownMethod { name: String, valid: String },

    #[error("Method {0} is not enabled in this deployment")]
    UnsupportedMethod(String),

    #[error("At least one discovery method is required")]
    NoMethods,
}

/// Failure of a single source adapter. Never fatal to the request as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("timeout")]
    Timeout,

    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("adapter task aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = e.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}
