//! Rule lookup.
//!
//! # Responsibilities
//! - Store compiled rules in configured order
//! - Look up the first rule whose prefix matches the request path
//! - Return the matched rule or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (rule lists are short)
//! - First match wins, not longest prefix

use crate::config::schema::ProxyRule;
use crate::routing::matcher::CompiledRule;
use crate::routing::RoutingError;

/// A rule that matched a request, with the unmatched rest of the path.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub rule: &'a CompiledRule,
    pub remainder: &'a str,
}

/// Ordered list of compiled rules.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compile every configured rule, keeping their order.
    pub fn from_config(rules: &[ProxyRule]) -> Result<Self, RoutingError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(rule_count = rules.len(), "Rule table compiled");
        Ok(Self { rules })
    }

    /// First rule whose prefix is a literal prefix of `path`.
    pub fn match_path<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.rules.iter().find_map(|rule| {
            rule.strip(path)
                .map(|remainder| RouteMatch { rule, remainder })
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
