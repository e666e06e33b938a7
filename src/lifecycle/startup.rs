//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the optional metrics endpoint
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - A metrics endpoint failure is logged, not fatal

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::net::{self, BindError};
use crate::observability::metrics;

/// A proxy ready to serve: subsystems built, socket bound.
pub struct Prepared {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Build the server and bind its listener.
pub async fn prepare(config: ProxyConfig) -> Result<Prepared, BindError> {
    if let Some(addr) = config
        .observability
        .metrics_address
        .as_deref()
        .and_then(|a| a.parse::<SocketAddr>().ok())
    {
        if let Err(err) = metrics::init_metrics(addr) {
            tracing::error!(address = %addr, error = %err, "Failed to start metrics endpoint");
        }
    }

    let listener = net::bind(&config.listener).await?;
    let local_addr = listener.local_addr().map_err(|source| BindError::Bind {
        address: config.listener.address(),
        source,
    })?;

    tracing::info!(
        address = %local_addr,
        origin_whitelist = ?config.policy.origin_whitelist,
        required_headers = ?config.policy.required_headers,
        removed_headers = ?config.policy.removed_headers,
        "Configuration loaded"
    );

    Ok(Prepared {
        server: HttpServer::new(config, local_addr),
        listener,
        local_addr,
    })
}
