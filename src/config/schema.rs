//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Defaults reproduce the stock deployment: `localhost:8080`, every origin
//! allowed, `Origin` and `X-Requested-With` required, cookies stripped.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

/// Root configuration for the CORS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port, concurrency cap).
    pub listener: ListenerConfig,

    /// Origin and header policy applied before forwarding.
    pub policy: PolicyConfig,

    /// Outbound request behaviour.
    pub forward: ForwardConfig,

    /// CORS response header policy.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host name or IP address to bind.
    pub host: String,

    /// TCP port (1-65535).
    pub port: u16,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            max_connections: 10_000,
        }
    }
}

impl ListenerConfig {
    /// `host:port` form used for resolution and logging.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Origin whitelist and header requirements.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allowed origins. Empty allows every origin.
    pub origin_whitelist: Vec<String>,

    /// Origins that are always refused, checked before the whitelist.
    pub origin_blacklist: Vec<String>,

    /// Headers that must be present on every forwarded request.
    pub required_headers: HeaderNameSet,

    /// Headers stripped from the request before forwarding and from the response.
    pub removed_headers: HeaderNameSet,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            origin_whitelist: Vec::new(),
            origin_blacklist: Vec::new(),
            required_headers: HeaderNameSet::from_static(&["origin", "x-requested-with"]),
            removed_headers: HeaderNameSet::from_static(&["cookie", "cookie2"]),
        }
    }
}

/// Outbound request settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Headers set on every outbound request, overriding client values.
    pub set_headers: BTreeMap<String, String>,

    /// Maximum redirects followed for GET/HEAD requests. 0 relays redirects as-is.
    pub max_redirects: u32,

    /// Append `X-Forwarded-For`, `X-Forwarded-Port` and `X-Forwarded-Proto`.
    pub xfwd: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            set_headers: BTreeMap::new(),
            max_redirects: 5,
            xfwd: true,
        }
    }
}

/// Value emitted in `Access-Control-Allow-Origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AllowOrigin {
    /// Always `*`; credentials are never allowed.
    #[default]
    Any,
    /// Echo the request origin and allow credentials.
    Echo,
}

/// CORS response header policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: AllowOrigin,

    /// `Access-Control-Max-Age` sent on preflight responses.
    pub max_age_secs: Option<u64>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce response headers, in seconds.
    pub upstream_secs: u64,

    /// Maximum gap between body frames in either direction, in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus scrape endpoint bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

/// A set of header names, normalised to lowercase on ingestion.
///
/// Deserializes from a list of strings; an invalid header name is a parse
/// error rather than a silently ignored entry.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct HeaderNameSet(Vec<HeaderName>);

impl HeaderNameSet {
    /// Build from names known to be valid.
    pub fn from_static(names: &[&'static str]) -> Self {
        let mut set = Self::default();
        for name in names {
            set.insert(HeaderName::from_static(name));
        }
        set
    }

    /// Parse a list of header names, lowercasing each one.
    pub fn parse<I, S>(names: I) -> Result<Self, InvalidHeaderName>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            let raw = name.as_ref().trim();
            let parsed = HeaderName::from_bytes(raw.to_ascii_lowercase().as_bytes())
                .map_err(|_| InvalidHeaderName(raw.to_string()))?;
            set.insert(parsed);
        }
        Ok(set)
    }

    fn insert(&mut self, name: HeaderName) {
        if !self.0.contains(&name) {
            self.0.push(name);
        }
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderName> {
        self.0.iter()
    }
}

impl fmt::Debug for HeaderNameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(|n| n.as_str())).finish()
    }
}

impl TryFrom<Vec<String>> for HeaderNameSet {
    type Error = InvalidHeaderName;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(names)
    }
}

impl From<HeaderNameSet> for Vec<String> {
    fn from(set: HeaderNameSet) -> Self {
        set.0.iter().map(|n| n.as_str().to_string()).collect()
    }
}

/// A configured header name that is not a valid HTTP token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid header name: {0:?}")]
pub struct InvalidHeaderName(pub String);
