// src/config.rs

//! Deployment configuration. Every field has a default so an empty (or
//! missing) config file yields a working setup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::models::MethodIdentifier;
use crate::error::ConfigError;
use crate::logging::project_directory;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "SUBSCOUT_CONFIG";

/// Common subdomain labels probed by the DNS method.
pub const DEFAULT_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "localhost", "webmail", "smtp", "pop", "ns1", "webdisk",
    "ns2", "cpanel", "whm", "autodiscover", "autoconfig", "mx", "test", "dev",
    "staging", "api", "admin", "blog", "shop", "forum", "support", "help",
    "secure", "ssl", "vpn", "remote", "demo", "beta", "alpha", "mobile",
    "app", "cdn", "static", "media", "images", "img", "assets", "files",
    "portal", "server", "ns", "email", "cloud", "backup", "mysql", "sql",
    "database", "db", "ftp2", "ns3", "dns", "search", "login", "panel",
    "control", "secure2", "admin2", "test2", "demo2", "beta2", "alpha2",
    "old", "new", "web", "web1", "web2", "home", "my", "all", "mobile2",
    "store", "news", "download", "upload", "video", "music", "game", "chat",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Methods this deployment registers adapters for.
    pub enabled_methods: Vec<MethodIdentifier>,
    /// Methods used when a request names none.
    pub default_methods: Vec<MethodIdentifier>,
    pub timeouts: TimeoutConfig,
    pub dns: DnsConfig,
    pub http: HttpConfig,
    pub endpoints: EndpointConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_methods: vec![
                MethodIdentifier::Dns,
                MethodIdentifier::Crt,
                MethodIdentifier::Hackertarget,
                MethodIdentifier::Threatcrowd,
                MethodIdentifier::Virustotal,
                MethodIdentifier::Google,
                MethodIdentifier::Bing,
                MethodIdentifier::Nslookup,
            ],
            default_methods: vec![MethodIdentifier::Dns, MethodIdentifier::Crt],
            timeouts: TimeoutConfig::default(),
            dns: DnsConfig::default(),
            http: HttpConfig::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

/// Per-method timeout budget, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub dns: u64,
    pub nslookup: u64,
    pub crt: u64,
    pub hackertarget: u64,
    pub threatcrowd: u64,
    pub virustotal: u64,
    pub google: u64,
    pub bing: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            dns: 5,
            nslookup: 5,
            crt: 15,
            hackertarget: 10,
            threatcrowd: 10,
            virustotal: 10,
            google: 10,
            bing: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn for_method(&self, method: MethodIdentifier) -> Duration {
        let secs = match method {
            MethodIdentifier::Dns => self.dns,
            MethodIdentifier::Nslookup => self.nslookup,
            MethodIdentifier::Crt => self.crt,
            MethodIdentifier::Hackertarget => self.hackertarget,
            MethodIdentifier::Threatcrowd => self.threatcrowd,
            MethodIdentifier::Virustotal => self.virustotal,
            MethodIdentifier::Google => self.google,
            MethodIdentifier::Bing => self.bing,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Upper bound on simultaneous wordlist lookups.
    pub concurrency: usize,
    pub lookup_timeout_ms: u64,
    pub attempts: usize,
    /// Optional file with one label per line; replaces `words` when set.
    pub wordlist_file: Option<PathBuf>,
    pub words: Vec<String>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            concurrency: 50,
            lookup_timeout_ms: 2000,
            attempts: 1,
            wordlist_file: None,
            words: DEFAULT_WORDLIST.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub virustotal_apikey: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Mozilla/5.0 (compatible; subscout/{})", env!("CARGO_PKG_VERSION")),
            virustotal_apikey: "public".to_string(),
        }
    }
}

/// Base URLs of the third-party providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub crt: String,
    pub hackertarget: String,
    pub threatcrowd: String,
    pub virustotal: String,
    pub google: String,
    pub bing: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            crt: "https://crt.sh".to_string(),
            hackertarget: "https://api.hackertarget.com".to_string(),
            threatcrowd: "https://www.threatcrowd.org".to_string(),
            virustotal: "https://www.virustotal.com".to_string(),
            google: "https://www.google.com".to_string(),
            bing: "https://www.bing.com".to_string(),
        }
    }
}

impl Config {
    /// Loads the config from `$SUBSCOUT_CONFIG`, then from the platform config
    /// directory, falling back to defaults when neither file exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = project_directory().map(|dirs| dirs.config_dir().join("config.toml"));
        match default_path {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults.");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading configuration.");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.resolve_wordlist()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn resolve_wordlist(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = &self.dns.wordlist_file {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            self.dns.words = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_ascii_lowercase)
                .collect();
            debug!(words = self.dns.words.len(), "Loaded DNS wordlist from file.");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_methods.is_empty() {
            return Err(ConfigError::Invalid("enabled_methods must not be empty".into()));
        }
        if let Some(m) = self
            .default_methods
            .iter()
            .find(|m| !self.enabled_methods.contains(*m))
        {
            return Err(ConfigError::Invalid(format!(
                "default method {m} is not in enabled_methods"
            )));
        }
        if self.dns.concurrency == 0 {
            return Err(ConfigError::Invalid("dns.concurrency must be at least 1".into()));
        }
        if self.dns.words.is_empty() {
            return Err(ConfigError::Invalid("dns wordlist is empty".into()));
        }
        if let Some(m) = self
            .enabled_methods
            .iter()
            .find(|m| self.timeouts.for_method(**m).is_zero())
        {
            return Err(ConfigError::Invalid(format!("timeout for {m} must be positive")));
        }
        Ok(())
    }
}
