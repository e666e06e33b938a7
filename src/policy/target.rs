//! Target URL extraction from the proxy path.
//!
//! The request path has the form `/<target-url>`. The target is taken from
//! the raw path-and-query; only when that fails to parse is it
//! percent-decoded and parsed again, so already-encoded query strings in a
//! literal target survive untouched.

use axum::http::Uri;
use percent_encoding::percent_decode_str;
use url::Url;

/// The raw target text: path-and-query without the leading `/`.
pub fn raw_target(uri: &Uri) -> &str {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    path_and_query.strip_prefix('/').unwrap_or(path_and_query)
}

/// Parse the target URL carried by `uri`.
///
/// Returns `None` unless the target is an absolute `http`/`https` URL with a host.
pub fn parse_target(uri: &Uri) -> Option<Url> {
    let raw = raw_target(uri);
    if raw.is_empty() {
        return None;
    }
    if let Some(url) = parse_absolute(raw) {
        return Some(url);
    }
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    parse_absolute(&decoded)
}

fn parse_absolute(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let web_scheme = matches!(url.scheme(), "http" | "https");
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (web_scheme && has_host).then_some(url)
}
