//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! CacheConfig (literals)
//!     → policy.rs (CacheSettings: budget, min size, extensions, TTL)
//!     → store.rs (BoundedCache, shared via Arc by the dispatcher)
//!
//! Per request:
//!     dispatcher → BoundedCache::get(path)
//!     miss → fetch → CacheSettings::is_cacheable → BoundedCache::set
//! ```
//!
//! # Design Decisions
//! - The store knows nothing about HTTP; keys are request paths
//! - Budget is counted in payload bytes only
//! - No persistence across restarts

pub mod policy;
pub mod store;

pub use policy::{extension_of, CacheSettings, DEFAULT_MAX_AGE_SECS};
pub use store::{BoundedCache, CacheEntry, CacheStats};
