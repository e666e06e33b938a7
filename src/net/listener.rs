//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured host
//! - Bind the first resolved address that accepts the bind
//! - Report resolution and bind failures as a fatal `BindError`

use std::io;

use tokio::net::{lookup_host, TcpListener};

use crate::config::ListenerConfig;

/// Error type for listener operations. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Host name could not be resolved.
    #[error("failed to resolve {address}: {source}")]
    Resolve { address: String, source: io::Error },
    /// Host resolved to no addresses.
    #[error("no addresses found for {0}")]
    NoAddress(String),
    /// Every resolved address refused the bind (e.g. already in use).
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },
}

/// Bind to `host:port` from the listener configuration.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, BindError> {
    let address = config.address();
    let candidates: Vec<_> = lookup_host(address.as_str())
        .await
        .map_err(|source| BindError::Resolve {
            address: address.clone(),
            source,
        })?
        .collect();

    let mut last_error = None;
    for addr in candidates {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(
                    address = %addr,
                    host = %config.host,
                    "Listener bound"
                );
                return Ok(listener);
            }
            Err(err) => {
                tracing::debug!(address = %addr, error = %err, "Bind attempt failed");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(source) => Err(BindError::Bind { address, source }),
        None => Err(BindError::NoAddress(address)),
    }
}
