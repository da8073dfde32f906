//! Prefix rule matching.
//!
//! # Responsibilities
//! - Compile a configured [`ProxyRule`] into a ready-to-match rule
//! - Match the request path prefix (literal, case-sensitive)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Targets are parsed once at startup

use url::Url;

use crate::config::schema::ProxyRule;
use crate::routing::RoutingError;

/// A proxy rule with its target URL parsed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    prefix: String,
    target: Url,
    use_proxy: bool,
    raw_redirect: Option<String>,
}

impl CompiledRule {
    /// Compile a configured rule.
    pub fn compile(rule: &ProxyRule) -> Result<Self, RoutingError> {
        let target = Url::parse(&rule.target).map_err(|source| RoutingError::InvalidTarget {
            prefix: rule.prefix.clone(),
            source,
        })?;

        Ok(Self {
            prefix: rule.prefix.clone(),
            target,
            use_proxy: rule.use_proxy,
            raw_redirect: rule.raw_redirect.clone(),
        })
    }

    /// If `path` starts with this rule's prefix, return the rest of it.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Whether the global forward proxy applies to this rule.
    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    pub fn raw_redirect(&self) -> Option<&str> {
        self.raw_redirect.as_deref()
    }
}
