//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream response (sanitized, streaming)
//! - Inject CORS headers on every response, including errors
//! - Answer preflight requests locally
//! - Serve the usage page for `/`
//!
//! # Design Decisions
//! - Upstream `access-control-*` headers are dropped in `relay` and replaced
//! - Exposed headers list the response's own header names
//! - `echo` mode is the only one that allows credentials

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tower_http::timeout::TimeoutBody;

use crate::config::{AllowOrigin, CorsConfig};
use crate::forward::Forwarded;
use crate::security::headers::HeaderSanitizer;

pub const X_REQUEST_URL: HeaderName = HeaderName::from_static("x-request-url");
pub const X_FINAL_URL: HeaderName = HeaderName::from_static("x-final-url");

const USAGE: &str = "\
This API enables cross-origin requests to anywhere.

Usage:

/               Shows this help text
/<url>          Proxies the request to <url> and adds CORS headers

Requests must be made with the headers listed in the proxy's
required_headers setting (by default Origin and X-Requested-With).
Cookies are stripped in both directions.
";

/// The parts of the inbound request CORS headers are derived from.
#[derive(Debug, Clone)]
pub struct CorsContext {
    origin: Option<HeaderValue>,
    method: HeaderValue,
    request_headers: Option<HeaderValue>,
}

impl CorsContext {
    pub fn from_request(method: &Method, headers: &HeaderMap) -> Self {
        let requested_method = headers.get(header::ACCESS_CONTROL_REQUEST_METHOD).cloned();
        let method = requested_method
            .or_else(|| HeaderValue::from_str(method.as_str()).ok())
            .unwrap_or_else(|| HeaderValue::from_static("GET"));

        Self {
            origin: headers.get(header::ORIGIN).cloned(),
            method,
            request_headers: headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS).cloned(),
        }
    }
}

/// A browser preflight: `OPTIONS` carrying `Access-Control-Request-Method`.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::OPTIONS && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Drop `access-control-*` headers set by the target.
pub fn strip_cors_headers(headers: &mut HeaderMap) {
    let stale: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_cors_header(name))
        .cloned()
        .collect();
    for name in stale {
        headers.remove(name);
    }
}

/// Add the proxy's CORS headers. Upstream ones are already gone (see [`relay`]).
pub fn apply_cors(headers: &mut HeaderMap, ctx: &CorsContext, config: &CorsConfig) {
    let exposed: Vec<&str> = headers
        .keys()
        .filter(|name| !is_cors_header(name))
        .map(HeaderName::as_str)
        .collect();
    if !exposed.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&exposed.join(",")) {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
    }

    match (config.allow_origin, &ctx.origin) {
        (AllowOrigin::Echo, Some(origin)) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.append(header::VARY, HeaderValue::from_static("origin"));
        }
        _ => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        }
    }

    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, ctx.method.clone());
    if let Some(requested) = &ctx.request_headers {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }
}

fn is_cors_header(name: &HeaderName) -> bool {
    name.as_str().starts_with("access-control-")
}

/// Local answer to a preflight; CORS headers are added by the caller.
pub fn preflight_response(config: &CorsConfig) -> Response {
    let mut response = StatusCode::OK.into_response();
    if let Some(max_age) = config.max_age_secs {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
    }
    response
}

pub fn usage_response() -> Response {
    (StatusCode::OK, USAGE).into_response()
}

/// Turn an upstream response into the client response.
///
/// Applies the response-direction sanitizer, records redirects and URLs,
/// and bounds the gap between body frames by `idle`.
pub fn relay(
    forwarded: Forwarded,
    request_url: &str,
    sanitizer: &HeaderSanitizer,
    idle: Duration,
) -> Response {
    let Forwarded {
        response,
        final_url,
        redirects,
    } = forwarded;
    let (mut parts, body) = response.into_parts();

    let mut headers = sanitizer.sanitize_response(&parts.headers);
    strip_cors_headers(&mut headers);
    for (i, hop) in redirects.iter().enumerate() {
        if let Some((name, value)) = hop.header(i + 1) {
            headers.insert(name, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(request_url) {
        headers.insert(X_REQUEST_URL, value);
    }
    if let Ok(value) = HeaderValue::from_str(final_url.as_str()) {
        headers.insert(X_FINAL_URL, value);
    }
    parts.headers = headers;

    Response::from_parts(parts, Body::new(TimeoutBody::new(idle, body)))
}
