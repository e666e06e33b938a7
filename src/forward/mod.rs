//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyDecision::Forward(url) + sanitized headers + streaming body
//!     → client.rs (pooled hyper client, upstream timeout)
//!     → redirect.rs (GET/HEAD only: follow Location up to max_redirects)
//!     → Forwarded { response, final_url, redirects }
//! ```
//!
//! # Design Decisions
//! - DNS/connect failures map to 502, header timeouts to 504
//! - Failures are terminal for the request; nothing is retried

pub mod client;
pub mod redirect;

pub use client::{build_client, Forwarded, Forwarder, UpstreamClient};
pub use redirect::RedirectHop;
