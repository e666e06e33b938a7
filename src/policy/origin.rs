//! Origin extraction and whitelist pattern matching.
//!
//! # Pattern Semantics
//! - `*` matches every request, including one with no origin
//! - `scheme://host[:port]` matches that exact serialised origin
//! - `*.example.com` matches hosts strictly below `example.com`
//! - anything else is an exact host match
//!
//! All comparisons are case-insensitive; default ports are elided before
//! comparing full origins.

use axum::http::{header, HeaderMap};
use url::Url;

/// The origin a request claims to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    /// ASCII serialisation (`https://app.test:8443`), or the raw header
    /// value when it is not a URL (e.g. `null`).
    pub serialized: String,
    /// Lowercase host, when the origin has one.
    pub host: Option<String>,
}

impl RequestOrigin {
    /// Origin from the `Origin` header, falling back to the `Referer` header.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        if let Some(origin) = header_str(headers, header::ORIGIN) {
            return Some(Self::parse(origin));
        }
        header_str(headers, header::REFERER)
            .and_then(|referer| Url::parse(referer).ok())
            .and_then(|url| Self::from_url(&url))
    }

    fn parse(raw: &str) -> Self {
        Url::parse(raw)
            .ok()
            .and_then(|url| Self::from_url(&url))
            .unwrap_or_else(|| Self {
                serialized: raw.trim().to_ascii_lowercase(),
                host: None,
            })
    }

    fn from_url(url: &Url) -> Option<Self> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return None;
        }
        Some(Self {
            serialized: origin.ascii_serialization(),
            host: url.host_str().map(str::to_ascii_lowercase),
        })
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// A compiled whitelist / blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    Any,
    Origin(String),
    Subdomain(String),
    Host(String),
}

impl OriginPattern {
    /// Compile a configured pattern. Returns `None` for malformed entries.
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern.is_empty() {
            return None;
        }
        if pattern == "*" {
            return Some(Self::Any);
        }
        if pattern.contains("://") {
            let url = Url::parse(&pattern).ok()?;
            return RequestOrigin::from_url(&url).map(|o| Self::Origin(o.serialized));
        }
        if let Some(parent) = pattern.strip_prefix("*.") {
            if parent.is_empty() || !is_host_like(parent) {
                return None;
            }
            return Some(Self::Subdomain(parent.to_string()));
        }
        if !is_host_like(&pattern) {
            return None;
        }
        Some(Self::Host(pattern))
    }

    pub fn matches(&self, origin: Option<&RequestOrigin>) -> bool {
        match (self, origin) {
            (Self::Any, _) => true,
            (_, None) => false,
            (Self::Origin(expected), Some(origin)) => origin.serialized == *expected,
            (Self::Host(expected), Some(origin)) => origin.host.as_deref() == Some(expected),
            (Self::Subdomain(parent), Some(origin)) => origin
                .host
                .as_deref()
                .and_then(|host| host.strip_suffix(parent.as_str()))
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
        }
    }
}

fn is_host_like(s: &str) -> bool {
    !s.contains(['*', '/', ' ', '?', '#', '@'])
}

/// Compile every pattern, skipping entries rejected by `OriginPattern::parse`.
///
/// Validation refuses configs with malformed entries, so nothing is dropped
/// for a validated config.
pub fn compile(patterns: &[String]) -> Vec<OriginPattern> {
    patterns
        .iter()
        .filter_map(|p| OriginPattern::parse(p))
        .collect()
}

/// True when any pattern matches.
pub fn any_match(patterns: &[OriginPattern], origin: Option<&RequestOrigin>) -> bool {
    patterns.iter().any(|p| p.matches(origin))
}
