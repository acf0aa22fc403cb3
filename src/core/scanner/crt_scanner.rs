// src/core/scanner/crt_scanner.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::models::MethodIdentifier;
use crate::core::scanner::{fetch_text, trim_base, SourceAdapter};
use crate::error::SourceError;

/// One certificate row of the crt.sh JSON output. Only the SAN list matters.
#[derive(Debug, Deserialize)]
struct CertificateEntry {
    name_value: String,
}

/// Certificate Transparency search through crt.sh.
///
/// Two queries are issued, `%.<domain>` for the subdomains and `<domain>` for
/// certificates issued on the apex, and their names are concatenated.
pub struct CrtShSource {
    client: Client,
    base_url: String,
}

impl CrtShSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    async fn query(&self, q: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, q, "Querying Certificate Transparency.");
        let request = self
            .client
            .get(&url)
            .query(&[("q", q), ("output", "json")])
            .timeout(timeout);

        let body = fetch_text(request).await?;
        let names = parse_ct_entries(&body)?;
        debug!(q, names = names.len(), "Certificate Transparency query answered.");
        Ok(names)
    }
}

#[async_trait]
impl SourceAdapter for CrtShSource {
    fn method(&self) -> MethodIdentifier {
        MethodIdentifier::Crt
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let wildcard_query = format!("%.{domain}");
        let (wildcard, exact) = tokio::join!(
            self.query(&wildcard_query, timeout),
            self.query(domain, timeout)
        );

        match (wildcard, exact) {
            (Err(e), Err(other)) => {
                warn!(domain, error = %e, other = %other, "Both Certificate Transparency queries failed.");
                Err(e)
            }
            (wildcard, exact) => {
                if let Err(e) = &wildcard {
                    warn!(domain, error = %e, "Wildcard CT query failed, keeping exact match results.");
                }
                if let Err(e) = &exact {
                    warn!(domain, error = %e, "Exact CT query failed, keeping wildcard results.");
                }
                let names: Vec<String> = wildcard
                    .unwrap_or_default()
                    .into_iter()
                    .chain(exact.unwrap_or_default())
                    .collect();
                info!(domain, names = names.len(), "Certificate Transparency lookup finished.");
                Ok(names)
            }
        }
    }
}

/// Parses the crt.sh JSON array and splits every multi-line `name_value`.
pub(crate) fn parse_ct_entries(body: &str) -> Result<Vec<String>, SourceError> {
    let entries: Vec<CertificateEntry> = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("crt.sh returned malformed JSON: {e}")))?;

    Ok(entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}
