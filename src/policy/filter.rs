//! Origin Policy Filter.
//!
//! # Responsibilities
//! - Enforce required request headers (400)
//! - Enforce origin blacklist and whitelist (403)
//! - Extract and validate the target URL (400)
//!
//! Checks run in that order; the first failure wins and no upstream
//! connection is attempted for a rejected request. Preflights skip only the
//! required-header check, since browsers never add custom headers to them.

use axum::http::{HeaderMap, HeaderName, StatusCode, Uri};
use url::Url;

use crate::config::{HeaderNameSet, PolicyConfig};
use crate::policy::origin::{self, OriginPattern, RequestOrigin};
use crate::policy::target::parse_target;

/// Why a request was refused before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyRejection {
    #[error("missing required header: {0}")]
    MissingHeader(HeaderName),
    #[error("origin not allowed")]
    OriginNotAllowed,
    #[error("invalid target")]
    InvalidTarget,
}

impl PolicyRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::InvalidTarget => StatusCode::BAD_REQUEST,
            Self::OriginNotAllowed => StatusCode::FORBIDDEN,
        }
    }
}

/// Outcome of the policy filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDecision {
    Forward(Url),
    Reject(PolicyRejection),
}

/// Compiled form of [`PolicyConfig`], built once at startup.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    required_headers: HeaderNameSet,
    whitelist: Vec<OriginPattern>,
    blacklist: Vec<OriginPattern>,
}

impl OriginPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            required_headers: config.required_headers.clone(),
            whitelist: origin::compile(&config.origin_whitelist),
            blacklist: origin::compile(&config.origin_blacklist),
        }
    }

    /// Decide whether a request may be forwarded.
    pub fn evaluate(&self, uri: &Uri, headers: &HeaderMap) -> ProxyDecision {
        if let Some(missing) = self
            .required_headers
            .iter()
            .find(|name| !headers.contains_key(*name))
        {
            return ProxyDecision::Reject(PolicyRejection::MissingHeader(missing.clone()));
        }
        self.evaluate_preflight(uri, headers)
    }

    /// Origin and target checks for a CORS preflight.
    pub fn evaluate_preflight(&self, uri: &Uri, headers: &HeaderMap) -> ProxyDecision {
        if !self.origin_allowed(RequestOrigin::from_headers(headers).as_ref()) {
            return ProxyDecision::Reject(PolicyRejection::OriginNotAllowed);
        }

        match parse_target(uri) {
            Some(url) => ProxyDecision::Forward(url),
            None => ProxyDecision::Reject(PolicyRejection::InvalidTarget),
        }
    }

    fn origin_allowed(&self, origin: Option<&RequestOrigin>) -> bool {
        if origin.is_some() && origin::any_match(&self.blacklist, origin) {
            return false;
        }
        self.whitelist.is_empty() || origin::any_match(&self.whitelist, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy(whitelist: &[&str], required: &[&str]) -> OriginPolicy {
        OriginPolicy::new(&PolicyConfig {
            origin_whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
            origin_blacklist: Vec::new(),
            required_headers: HeaderNameSet::parse(required).unwrap(),
            removed_headers: HeaderNameSet::default(),
        })
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn forwards_valid_request() {
        let decision = policy(&[], &["origin"]).evaluate(
            &uri("/http://example.com/data"),
            &headers(&[("origin", "https://a.test")]),
        );
        assert_eq!(
            decision,
            ProxyDecision::Forward(Url::parse("http://example.com/data").unwrap())
        );
    }

    #[test]
    fn required_header_checked_before_origin() {
        let decision = policy(&["allowed.test"], &["origin", "x-requested-with"]).evaluate(
            &uri("/http://example.com/"),
            &headers(&[("origin", "https://evil.test")]),
        );
        let ProxyDecision::Reject(rejection) = decision else {
            panic!("expected rejection");
        };
        assert_eq!(
            rejection,
            PolicyRejection::MissingHeader(HeaderName::from_static("x-requested-with"))
        );
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn required_header_names_are_case_insensitive() {
        let decision = policy(&[], &["X-Requested-With"]).evaluate(
            &uri("/http://example.com/"),
            &headers(&[("x-requested-with", "XMLHttpRequest")]),
        );
        assert!(matches!(decision, ProxyDecision::Forward(_)));
    }

    #[test]
    fn origin_outside_whitelist_is_forbidden() {
        let decision = policy(&["*.allowed.test"], &[]).evaluate(
            &uri("/http://example.com/"),
            &headers(&[("origin", "https://evil.test")]),
        );
        assert_eq!(decision, ProxyDecision::Reject(PolicyRejection::OriginNotAllowed));
        assert_eq!(PolicyRejection::OriginNotAllowed.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_origin_fails_non_empty_whitelist() {
        let decision = policy(&["allowed.test"], &[])
            .evaluate(&uri("/http://example.com/"), &HeaderMap::new());
        assert_eq!(decision, ProxyDecision::Reject(PolicyRejection::OriginNotAllowed));
    }

    #[test]
    fn blacklist_wins_over_whitelist() {
        let mut config = PolicyConfig {
            origin_whitelist: vec!["*".into()],
            origin_blacklist: vec!["evil.test".into()],
            required_headers: HeaderNameSet::default(),
            removed_headers: HeaderNameSet::default(),
        };
        let decision = OriginPolicy::new(&config).evaluate(
            &uri("/http://example.com/"),
            &headers(&[("origin", "https://evil.test")]),
        );
        assert_eq!(decision, ProxyDecision::Reject(PolicyRejection::OriginNotAllowed));

        config.origin_blacklist.clear();
        let decision = OriginPolicy::new(&config).evaluate(
            &uri("/http://example.com/"),
            &headers(&[("origin", "https://evil.test")]),
        );
        assert!(matches!(decision, ProxyDecision::Forward(_)));
    }

    #[test]
    fn malformed_target_rejected_last() {
        let decision = policy(&[], &[]).evaluate(&uri("/not-a-url"), &HeaderMap::new());
        assert_eq!(decision, ProxyDecision::Reject(PolicyRejection::InvalidTarget));
        assert_eq!(PolicyRejection::InvalidTarget.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn preflight_skips_required_headers_only() {
        let policy = OriginPolicy::new(&PolicyConfig {
            origin_whitelist: vec!["allowed.test".into()],
            origin_blacklist: vec!["evil.test".into()],
            required_headers: HeaderNameSet::parse(["origin", "x-requested-with"]).unwrap(),
            removed_headers: HeaderNameSet::default(),
        });
        let target = uri("/http://example.com/");

        let allowed =
            policy.evaluate_preflight(&target, &headers(&[("origin", "https://allowed.test")]));
        assert!(matches!(allowed, ProxyDecision::Forward(_)));

        let evil = policy.evaluate_preflight(&target, &headers(&[("origin", "https://evil.test")]));
        assert_eq!(evil, ProxyDecision::Reject(PolicyRejection::OriginNotAllowed));

        let stranger =
            policy.evaluate_preflight(&target, &headers(&[("origin", "https://other.test")]));
        assert_eq!(stranger, ProxyDecision::Reject(PolicyRejection::OriginNotAllowed));

        let malformed = policy.evaluate_preflight(
            &uri("/not-a-url"),
            &headers(&[("origin", "https://allowed.test")]),
        );
        assert_eq!(malformed, ProxyDecision::Reject(PolicyRejection::InvalidTarget));
    }
}
