// src/core/scanner/search_scanner.rs

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::core::models::MethodIdentifier;
use crate::core::scanner::{fetch_text, trim_base, SourceAdapter};
use crate::error::SourceError;

/// Search engines queried with a `site:` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    Google,
    Bing,
}

impl SearchEngine {
    fn method(self) -> MethodIdentifier {
        match self {
            SearchEngine::Google => MethodIdentifier::Google,
            SearchEngine::Bing => MethodIdentifier::Bing,
        }
    }

    /// Element holding the organic results. Block, captcha and consent pages
    /// are served with a 200 but lack it.
    fn results_container(self) -> &'static str {
        match self {
            SearchEngine::Google => "#search, #rso",
            SearchEngine::Bing => "#b_results",
        }
    }

    /// Extra query parameter asking for as many results per page as allowed.
    fn page_size_param(self) -> (&'static str, &'static str) {
        match self {
            SearchEngine::Google => ("num", "100"),
            SearchEngine::Bing => ("count", "50"),
        }
    }
}

/// Scrapes one page of `site:<domain>` search results.
pub struct SearchEngineSource {
    engine: SearchEngine,
    client: Client,
    base_url: String,
}

impl SearchEngineSource {
    pub fn new(engine: SearchEngine, client: Client, base_url: &str) -> Self {
        Self {
            engine,
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl SourceAdapter for SearchEngineSource {
    fn method(&self) -> MethodIdentifier {
        self.engine.method()
    }

    async fn discover(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/search", self.base_url);
        let site_query = format!("site:{domain}");
        let (size_key, size_value) = self.engine.page_size_param();
        debug!(engine = ?self.engine, url = %url, q = %site_query, "Querying search engine.");

        let request = self
            .client
            .get(&url)
            .query(&[("q", site_query.as_str()), (size_key, size_value)])
            .timeout(timeout);

        let body = fetch_text(request).await?;
        let hosts = parse_search_results(self.engine, &body, domain)?;
        info!(engine = ?self.engine, domain, hosts = hosts.len(), "Search engine lookup finished.");
        Ok(hosts)
    }
}

/// Extracts candidate hosts from the results container of a page: first
/// the host of every link, then every name under `domain` mentioned in the
/// text. A page without the container is a failure.
pub(crate) fn parse_search_results(
    engine: SearchEngine,
    html: &str,
    domain: &str,
) -> Result<Vec<String>, SourceError> {
    let mention = Regex::new(&format!(
        r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{{0,61}}[a-z0-9])?\.)+{}\b",
        regex::escape(domain)
    ))
    .map_err(|e| SourceError::Parse(format!("invalid hostname pattern: {e}")))?;
    let container = Selector::parse(engine.results_container())
        .map_err(|e| SourceError::Parse(format!("invalid results selector: {e}")))?;
    let links = Selector::parse("a[href]")
        .map_err(|e| SourceError::Parse(format!("invalid link selector: {e}")))?;
    let title = Selector::parse("title")
        .map_err(|e| SourceError::Parse(format!("invalid title selector: {e}")))?;

    let document = Html::parse_document(html);
    let results = document.select(&container).next().ok_or_else(|| {
        let title = document
            .select(&title)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        SourceError::Parse(format!("{engine:?} page has no results (title: {:?})", title.trim()))
    })?;

    let mut hosts: Vec<String> = results
        .select(&links)
        .filter_map(|el| el.value().attr("href").and_then(link_host))
        .collect();

    let text = results.text().collect::<Vec<_>>().join(" ");
    hosts.extend(mention.find_iter(&text).map(|m| m.as_str().to_string()));

    Ok(hosts)
}

/// Host of a result link, unwrapping `/url?q=<target>` redirect links.
fn link_host(href: &str) -> Option<String> {
    let target = if href.starts_with("/url?") {
        let wrapped = Url::parse(&format!("https://redirect.invalid{href}")).ok()?;
        wrapped
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?
    } else {
        href.to_string()
    };

    Url::parse(&target).ok()?.host_str().map(str::to_string)
}
