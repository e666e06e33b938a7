//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → headers.rs (drop removed + hop-by-hop + host, add X-Forwarded-*)
//! Response to client:
//!     → headers.rs (drop removed + their set- counterparts + hop-by-hop)
//! ```
//!
//! # Design Decisions
//! - Credentials never reach the third-party target
//! - A target can never set cookies on the proxy's origin

pub mod headers;

pub use headers::{sanitize, HeaderSanitizer};
