// src/core/normalizer.rs

//! Canonicalizes raw candidates returned by the sources. Anything that does
//! not survive is silently dropped; rejection is a filter, not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::core::models::NormalizedHostname;

/// A single DNS label: alphanumerics and inner hyphens, 1 to 63 characters.
static RE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").unwrap());

const MAX_NAME_LEN: usize = 253;

/// Checks DNS name syntax on an already lowercased, dot-free-at-the-end name.
pub fn is_valid_dns_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && name.split('.').all(|l| RE_LABEL.is_match(l))
}

/// Lowercases and strips the trailing dot of a user supplied domain, returning
/// `None` when it is not a plain DNS name (schemes, paths and ports included).
pub fn canonical_domain(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_ascii_lowercase();
    let name = lowered.strip_suffix('.').unwrap_or(&lowered);
    is_valid_dns_name(name).then(|| name.to_string())
}

/// Normalizes one raw candidate against `domain` (which must already be canonical).
///
/// # Returns
/// `Some(hostname)` when the candidate is the domain itself or one of its
/// subdomains, `None` otherwise.
pub fn normalize(raw: &str, domain: &str) -> Option<NormalizedHostname> {
    let lowered = raw.trim().to_ascii_lowercase();
    let mut name = lowered.as_str();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = name.strip_prefix(scheme) {
            name = rest;
            break;
        }
    }

    let wildcard = name.starts_with("*.");
    if wildcard {
        name = &name[2..];
    }
    let name = name.strip_suffix('.').unwrap_or(name);

    if !is_valid_dns_name(name) {
        return None;
    }

    let in_scope = if name == domain {
        // `*.example.com` names no concrete host of its own.
        !wildcard
    } else {
        name.len() > domain.len()
            && name.ends_with(domain)
            && name.as_bytes()[name.len() - domain.len() - 1] == b'.'
    };

    in_scope.then(|| NormalizedHostname::new_unchecked(name.to_string()))
}

/// Normalizes a batch of candidates, keeping the first occurrence of each
/// accepted hostname in input order.
pub fn normalize_all<I, S>(raws: I, domain: &str) -> Vec<NormalizedHostname>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raws.into_iter()
        .filter_map(|raw| normalize(raw.as_ref(), domain))
        .filter(|host| seen.insert(host.clone()))
        .collect()
}
