//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (stock deployment values)
//!     → loader.rs (optional TOML file)
//!     → loader.rs (CLI / environment overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Header names are parsed and lowercased at ingestion
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, resolve_config, ConfigError, ConfigOverrides};
pub use schema::{
    AllowOrigin, CorsConfig, ForwardConfig, HeaderNameSet, ListenerConfig, ObservabilityConfig,
    PolicyConfig, ProxyConfig, TimeoutConfig,
};
