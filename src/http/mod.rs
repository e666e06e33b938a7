//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve, keep-alive)
//!     → server.rs (middleware: request ID, trace, concurrency cap)
//!     → response.rs (preflight / usage answered locally)
//!     → policy::OriginPolicy (reject 400/403)
//!     → security::headers (sanitize request)
//!     → forward::Forwarder (upstream, 502/504)
//!     → response.rs (sanitize response, CORS headers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Outcome, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
