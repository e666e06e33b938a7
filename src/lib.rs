//! CORS-anywhere forwarding proxy library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::listener ──▶ http::server ──▶ policy::filter
//!                                                            │
//!                                       reject 400/403 ◀─────┤
//!                                                            ▼
//!                                                  security::headers (request)
//!                                                            │
//!                                                            ▼
//!     Client Response                                 forward::client ──▶ Target
//!     ◀────────────── http::response (CORS) ◀── security::headers (response)
//! ```
//!
//! Cross-cutting: `config`, `observability`, `lifecycle`, `error`.

// Core subsystems
pub mod config;
pub mod forward;
pub mod http;
pub mod net;
pub mod policy;
pub mod security;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use error::{ProxyError, UpstreamError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::BindError;
