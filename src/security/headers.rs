//! Header sanitization and forwarding headers.
//!
//! # Responsibilities
//! - Strip configured sensitive headers in both directions
//! - Strip hop-by-hop headers
//! - Add X-Forwarded-For, X-Forwarded-Port, X-Forwarded-Proto
//!
//! # Design Decisions
//! - Sanitization builds a new map; the input is never mutated
//! - Removing `cookie` on the way out also drops `set-cookie` on the way
//!   back, so a target can never plant cookies on the proxy's origin
//! - Ordering and duplicate values of surviving headers are preserved

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::HeaderNameSet;

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_PORT: HeaderName = HeaderName::from_static("x-forwarded-port");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Hop-by-hop headers (RFC 9110 §7.6.1) never relayed by a proxy.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    KEEP_ALIVE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Return a copy of `headers` without any header named in `removed`.
pub fn sanitize(headers: &HeaderMap, removed: &HeaderNameSet) -> HeaderMap {
    retain(headers, |name| !removed.contains(name))
}

fn retain(headers: &HeaderMap, keep: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if keep(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Names listed in the `Connection` header, which are hop-by-hop for this message.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect()
}

/// Applies the configured header removal to requests and responses.
#[derive(Debug, Clone)]
pub struct HeaderSanitizer {
    request: HeaderNameSet,
    response: HeaderNameSet,
}

impl HeaderSanitizer {
    pub fn new(removed: &HeaderNameSet) -> Self {
        let mut request: Vec<String> = removed.clone().into();
        request.push(header::HOST.as_str().to_string());

        let mut response: Vec<String> = removed.clone().into();
        response.extend(removed.iter().map(|name| format!("set-{}", name.as_str())));

        for set in [&mut request, &mut response] {
            set.extend(HOP_BY_HOP.iter().map(|h| h.as_str().to_string()));
        }

        Self {
            // Every entry is derived from valid header names.
            request: HeaderNameSet::parse(request).unwrap_or_default(),
            response: HeaderNameSet::parse(response).unwrap_or_default(),
        }
    }

    /// Headers to send upstream. `host` is re-derived from the target URL.
    pub fn sanitize_request(&self, headers: &HeaderMap) -> HeaderMap {
        let listed = connection_listed(headers);
        retain(headers, |name| !self.request.contains(name) && !listed.contains(name))
    }

    /// Headers to relay back to the client.
    pub fn sanitize_response(&self, headers: &HeaderMap) -> HeaderMap {
        let listed = connection_listed(headers);
        retain(headers, |name| !self.response.contains(name) && !listed.contains(name))
    }
}

/// Append the client address to `X-Forwarded-For` and set port and proto.
pub fn append_forwarded(headers: &mut HeaderMap, client_ip: IpAddr, port: u16) {
    let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {client_ip}"),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    headers.insert(X_FORWARDED_PORT, HeaderValue::from(port));
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}
