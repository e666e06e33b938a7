//! Redirect handling for bodiless requests.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

/// One followed redirect, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    pub status: StatusCode,
    pub location: Url,
}

impl RedirectHop {
    /// `x-cors-redirect-<n>: <status> <url>`, `n` starting at 1.
    pub fn header(&self, n: usize) -> Option<(HeaderName, HeaderValue)> {
        let name = HeaderName::from_bytes(format!("x-cors-redirect-{n}").as_bytes()).ok()?;
        let value =
            HeaderValue::from_str(&format!("{} {}", self.status.as_u16(), self.location)).ok()?;
        Some((name, value))
    }
}

/// Only requests without a body can be replayed against a new location.
pub fn may_follow(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

pub fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve `Location` against the URL that produced it.
///
/// Returns `None` for missing, unparseable, or non-web locations; the
/// redirect is then relayed to the client unchanged.
pub fn next_location(headers: &HeaderMap, base: &Url) -> Option<Url> {
    let location = headers.get(header::LOCATION)?.to_str().ok()?;
    let next = base.join(location).ok()?;
    matches!(next.scheme(), "http" | "https").then_some(next)
}
