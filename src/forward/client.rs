//! Upstream client and request replay.
//!
//! # Responsibilities
//! - Pooled HTTP/HTTPS connections to arbitrary targets
//! - Replay method, sanitized headers and streaming body
//! - Bound the wait for response headers
//! - Follow redirects for GET/HEAD
//!
//! # Design Decisions
//! - No retries: cross-origin requests are not assumed idempotent
//! - hyper's pool hands an HTTP/1 connection to one request at a time
//! - Bodies are streamed, never buffered

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, Uri},
};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::{ForwardConfig, TimeoutConfig};
use crate::error::{ProxyError, UpstreamError};
use crate::forward::redirect::{self, RedirectHop};

pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the pooled client shared by every request.
pub fn build_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .build(https)
}

/// Upstream response plus where it actually came from.
#[derive(Debug)]
pub struct Forwarded {
    pub response: Response<Incoming>,
    pub final_url: Url,
    pub redirects: Vec<RedirectHop>,
}

/// Relays requests to their target URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    upstream_timeout: Duration,
    max_redirects: u32,
    set_headers: HeaderMap,
}

impl Forwarder {
    pub fn new(client: UpstreamClient, forward: &ForwardConfig, timeouts: &TimeoutConfig) -> Self {
        let mut set_headers = HeaderMap::new();
        for (name, value) in &forward.set_headers {
            // Validated at load time.
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                set_headers.insert(name, value);
            }
        }

        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
            max_redirects: forward.max_redirects,
            set_headers,
        }
    }

    /// Send `method target` upstream with already-sanitized `headers`.
    pub async fn forward(
        &self,
        method: Method,
        target: Url,
        headers: HeaderMap,
        body: Body,
    ) -> Result<Forwarded, ProxyError> {
        let follow = self.max_redirects > 0 && redirect::may_follow(&method);
        let mut headers = headers;
        for (name, value) in &self.set_headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut url = target;
        let mut redirects = Vec::new();
        let mut body = Some(body);

        loop {
            let request =
                build_request(&method, &url, &headers, body.take().unwrap_or_default())?;
            let response = self.send(request).await?;

            let status = response.status();
            let hops_left = redirects.len() < self.max_redirects as usize;
            if follow && hops_left && redirect::is_redirect(status) {
                if let Some(next) = redirect::next_location(response.headers(), &url) {
                    tracing::debug!(
                        status = %status,
                        from = %url,
                        to = %next,
                        "Following redirect"
                    );
                    redirects.push(RedirectHop {
                        status,
                        location: next.clone(),
                    });
                    url = next;
                    continue;
                }
            }

            return Ok(Forwarded {
                response,
                final_url: url,
                redirects,
            });
        }
    }

    async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, UpstreamError> {
        match tokio::time::timeout(self.upstream_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(UpstreamError::unreachable(&err)),
            Err(_) => Err(UpstreamError::Timeout(self.upstream_timeout)),
        }
    }
}

fn build_request(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    body: Body,
) -> Result<Request<Body>, ProxyError> {
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|e| ProxyError::Malformed(format!("target {url}: {e}")))?;

    let mut request = Request::builder()
        .method(method.clone())
        .uri(uri)
        .body(body)
        .map_err(|e| ProxyError::Malformed(e.to_string()))?;
    *request.headers_mut() = headers.clone();
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_target_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        let url = Url::parse("https://example.com:8443/a/b?c=d").unwrap();

        let request = build_request(&Method::PUT, &url, &headers, Body::empty()).unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.uri(), "https://example.com:8443/a/b?c=d");
        assert_eq!(request.headers(), &headers);
    }

    #[tokio::test]
    async fn set_headers_loaded_from_config() {
        let mut forward = ForwardConfig::default();
        forward.set_headers.insert("x-proxied-by".into(), "cors-proxy".into());
        let timeouts = TimeoutConfig::default();
        let forwarder = Forwarder::new(build_client(&timeouts), &forward, &timeouts);
        assert_eq!(forwarder.set_headers["x-proxied-by"], "cors-proxy");
        assert_eq!(forwarder.upstream_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn https_connector_finds_its_crypto_provider() {
        // rustls panics here when more than one crypto backend is compiled in.
        let timeouts = TimeoutConfig::default();
        let client = build_client(&timeouts);
        let forwarder = Forwarder::new(client, &ForwardConfig::default(), &timeouts);
        assert_eq!(forwarder.max_redirects, 5);
    }
}
