//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, or the legacy JSON layout)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, literal resolution)
//!     → ProxyConfig (validated, immutable)
//!     → cache::CacheSettings / routing::RuleTable built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Malformed size/time literals abort startup, never a request

pub mod literal;
pub mod loader;
pub mod schema;
pub mod validation;

pub use literal::{format_size, ConfigFormatError, SizeLiteral, TimeLiteral};
pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, HttpProxyConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, ProxyRule,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
