//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path + query
//!     → router.rs (first-match prefix lookup)
//!     → matcher.rs (compiled rule: prefix, target, flags)
//!     → rewrite.rs (sanitize remainder, resolve upstream URL, redirect Location)
//!     → Return: matched rule or NoMatch
//!
//! Rule Compilation (at startup):
//!     ProxyRule[]
//!     → Parse targets
//!     → Freeze as immutable RuleTable (configured order kept)
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (configured order)

use thiserror::Error;

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use matcher::CompiledRule;
pub use router::{RouteMatch, RuleTable};

/// Error compiling the rule table.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("rule {prefix:?} has an invalid target: {source}")]
    InvalidTarget {
        prefix: String,
        source: url::ParseError,
    },
}
