//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, concurrency cap)
//! - Bound body frame gaps in both directions by `timeouts.idle_secs`
//! - Bind server to listener with graceful shutdown
//! - Drive each request through filter → sanitize → forward → relay,
//!   or filter → local answer for preflights

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutBody,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::forward::{build_client, Forwarder};
use crate::http::request::{request_id, Outcome};
use crate::http::response::{
    apply_cors, is_preflight, preflight_response, relay, usage_response, CorsContext,
};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::policy::{target::raw_target, OriginPolicy, ProxyDecision};
use crate::security::headers::{append_forwarded, HeaderSanitizer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub policy: Arc<OriginPolicy>,
    pub sanitizer: Arc<HeaderSanitizer>,
    pub forwarder: Arc<Forwarder>,
    /// Address actually bound; differs from the config when it asks for port 0.
    pub local_addr: SocketAddr,
}

impl AppState {
    pub fn new(config: ProxyConfig, local_addr: SocketAddr) -> Self {
        let client = build_client(&config.timeouts);
        Self {
            local_addr,
            policy: Arc::new(OriginPolicy::new(&config.policy)),
            sanitizer: Arc::new(HeaderSanitizer::new(&config.policy.removed_headers)),
            forwarder: Arc::new(Forwarder::new(client, &config.forward, &config.timeouts)),
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server for a listener bound at `local_addr`.
    pub fn new(config: ProxyConfig, local_addr: SocketAddr) -> Self {
        let state = AppState::new(config, local_addr);
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections));

        // Every path is a target URL, so the whole surface is one fallback.
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.config.listener.max_connections,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Filters the request, forwards it to its target and relays the response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let cors = CorsContext::from_request(request.method(), request.headers());

    let (outcome, mut response) = handle(&state, peer, request).await;

    apply_cors(response.headers_mut(), &cors, &state.config.cors);
    metrics::record_request(outcome, response.status().as_u16(), start_time);
    response
}

async fn handle(state: &AppState, peer: SocketAddr, request: Request<Body>) -> (Outcome, Response) {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);

    if raw_target(&parts.uri).is_empty() {
        return (Outcome::Usage, usage_response());
    }

    let preflight = is_preflight(&parts.method, &parts.headers);
    let decision = if preflight {
        state.policy.evaluate_preflight(&parts.uri, &parts.headers)
    } else {
        state.policy.evaluate(&parts.uri, &parts.headers)
    };

    let target = match decision {
        ProxyDecision::Forward(url) => url,
        ProxyDecision::Reject(rejection) => {
            tracing::info!(
                request_id = %request_id,
                path = %parts.uri,
                reason = %rejection,
                "Request rejected"
            );
            return (Outcome::Rejected, ProxyError::from(rejection).into_response());
        }
    };

    if preflight {
        tracing::debug!(request_id = %request_id, target = %target, "Answering preflight");
        return (Outcome::Preflight, preflight_response(&state.config.cors));
    }

    let mut headers = state.sanitizer.sanitize_request(&parts.headers);
    if state.config.forward.xfwd {
        append_forwarded(&mut headers, peer.ip(), state.local_addr.port());
    }

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        target = %target,
        "Forwarding request"
    );

    let idle = Duration::from_secs(state.config.timeouts.idle_secs);
    // An empty body stays empty so hyper does not switch GETs to chunked framing.
    let body = if body.is_end_stream() {
        Body::empty()
    } else {
        Body::new(TimeoutBody::new(idle, body))
    };

    let request_url = target.to_string();
    match state
        .forwarder
        .forward(parts.method, target, headers, body)
        .await
    {
        Ok(forwarded) => {
            tracing::debug!(
                request_id = %request_id,
                status = %forwarded.response.status(),
                final_url = %forwarded.final_url,
                redirects = forwarded.redirects.len(),
                "Upstream responded"
            );
            (
                Outcome::Responded,
                relay(forwarded, &request_url, &state.sanitizer, idle),
            )
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                target = %request_url,
                error = %err,
                "Upstream request failed"
            );
            (Outcome::Failed, err.into_response())
        }
    }
}
