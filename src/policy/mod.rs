//! Origin policy subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (uri + headers):
//!     → filter.rs (required headers → origin lists → target)
//!     → origin.rs (Origin / Referer extraction, pattern matching)
//!     → target.rs (absolute URL from the proxy path)
//!     → ProxyDecision::{Forward(url) | Reject(reason)}
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once at startup from the immutable config
//! - Pure functions over headers; no I/O, trivially testable
//! - Fail closed: no origin never satisfies a non-empty whitelist

pub mod filter;
pub mod origin;
pub mod target;

pub use filter::{OriginPolicy, PolicyRejection, ProxyDecision};
pub use origin::{OriginPattern, RequestOrigin};
