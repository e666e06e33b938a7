//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host, port)
//!     → listener.rs (resolve, bind)
//!     → tokio TcpListener
//!     → Hand off to HTTP layer (axum::serve, one task per connection)
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal and map to a non-zero exit code
//! - Plain HTTP only; TLS termination belongs in front of the proxy

pub mod listener;

pub use listener::{bind, BindError};
