//! Request dispatch: rule → redirect or cache → upstream → cache.
//!
//! # State Machine
//! ```text
//! Start → RuleMatch ─ notfound ─→ NotFound
//!             │ found
//!             ▼
//!        RedirectCheck ─ raw=true ─→ Redirect
//!             │ normal
//!             ▼
//!        CacheLookup ─ hit ─→ CacheHit
//!             │ miss
//!             ▼
//!        UpstreamFetch ─ error ─→ UpstreamError
//!             │ ok
//!             ▼
//!        MaybeCache → Fetched
//! ```
//!
//! # Design Decisions
//! - Cache keys are the original request path; the query string is ignored
//! - Redirect mode never reads or writes the cache
//! - No request coalescing: concurrent misses for one path all fetch, and
//!   the last store wins
//! - The upstream fetch is the only await point

use std::sync::Arc;

use axum::http::Method;

use crate::cache::{BoundedCache, CacheSettings};
use crate::config::format_size;
use crate::observability::metrics;
use crate::proxy::error::{ProxyError, UpstreamError};
use crate::proxy::response::{
    CacheHeaders, ResponseDescriptor, RouteOutcome, DEFAULT_CONTENT_TYPE,
};
use crate::proxy::upstream::Upstream;
use crate::routing::rewrite::{is_raw_request, redirect_location, resolve_upstream, sanitize_path};
use crate::routing::RuleTable;

/// Routes requests to upstreams through the shared cache.
#[derive(Debug)]
pub struct ProxyDispatcher<U> {
    rules: RuleTable,
    cache: Arc<BoundedCache>,
    settings: CacheSettings,
    cache_headers: CacheHeaders,
    upstream: U,
}

impl<U: Upstream> ProxyDispatcher<U> {
    pub fn new(
        rules: RuleTable,
        cache: Arc<BoundedCache>,
        settings: CacheSettings,
        upstream: U,
    ) -> Self {
        let cache_headers = CacheHeaders::new(settings.max_age_secs);
        Self {
            rules,
            cache,
            settings,
            cache_headers,
            upstream,
        }
    }

    pub fn cache(&self) -> &Arc<BoundedCache> {
        &self.cache
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn cache_headers(&self) -> &CacheHeaders {
        &self.cache_headers
    }

    /// Whether some proxy rule claims `path`.
    pub fn handles(&self, path: &str) -> bool {
        self.rules.match_path(path).is_some()
    }

    /// Handle one request. Every failure becomes an error response.
    pub async fn route(
        &self,
        path: &str,
        query: &[(String, String)],
        method: &Method,
    ) -> ResponseDescriptor {
        match self.try_route(path, query, method).await {
            Ok(response) => response,
            Err(err) => {
                let outcome = match &err {
                    ProxyError::NoMatchingRule(_) => {
                        tracing::warn!(path = %path, "No proxy rule matched");
                        RouteOutcome::NotFound
                    }
                    ProxyError::Upstream(upstream) => {
                        metrics::record_upstream_error(upstream_error_kind(upstream));
                        tracing::error!(path = %path, error = %err, "Upstream fetch failed");
                        RouteOutcome::UpstreamError
                    }
                    _ => {
                        tracing::error!(path = %path, error = %err, "Request failed");
                        RouteOutcome::UpstreamError
                    }
                };
                ResponseDescriptor::error(err.status(), err.body(), outcome)
            }
        }
    }

    async fn try_route(
        &self,
        path: &str,
        query: &[(String, String)],
        method: &Method,
    ) -> Result<ResponseDescriptor, ProxyError> {
        let matched = self
            .rules
            .match_path(path)
            .ok_or_else(|| ProxyError::NoMatchingRule(path.to_string()))?;

        let sanitized = sanitize_path(matched.remainder);
        let upstream_url = resolve_upstream(matched.rule.target(), &sanitized)?;

        tracing::info!(
            method = %method,
            path = %path,
            prefix = %matched.rule.prefix(),
            upstream = %upstream_url,
            "Proxying request"
        );

        if is_raw_request(query) {
            let location =
                redirect_location(matched.rule.raw_redirect(), &upstream_url, &sanitized, query);
            tracing::info!(path = %path, location = %location, "Redirecting");
            return Ok(ResponseDescriptor::redirect(&location)?);
        }

        if self.settings.enabled {
            let cached = self.cache.get(path);
            metrics::record_cache_lookup(cached.is_some());
            if let Some(entry) = cached {
                tracing::info!(
                    path = %path,
                    size = %format_size(entry.size_bytes),
                    hits = entry.access_count,
                    "Cache hit"
                );
                return Ok(ResponseDescriptor::payload(
                    RouteOutcome::CacheHit,
                    entry.payload,
                    &entry.content_type,
                    &self.cache_headers,
                ));
            }
        }

        let fetched = self
            .upstream
            .fetch(&upstream_url, matched.rule.use_proxy())
            .await?;
        let content_type = fetched
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let size = fetched.body.len() as u64;

        if self.settings.is_cacheable(path, size) {
            let stored = self.cache.set(
                path,
                fetched.body.clone(),
                content_type.clone(),
                self.settings.default_ttl,
            );
            if stored {
                tracing::info!(path = %path, size = %format_size(size), "Cached response");
            } else {
                tracing::debug!(path = %path, size = %format_size(size), "Response too large to cache");
            }
            metrics::record_cache_store(stored);
            metrics::record_cache_stats(&self.cache.stats());
        }

        tracing::info!(path = %path, size = %format_size(size), "Fetched from upstream");

        Ok(ResponseDescriptor::payload(
            RouteOutcome::Fetched,
            fetched.body,
            &content_type,
            &self.cache_headers,
        ))
    }
}

fn upstream_error_kind(err: &UpstreamError) -> &'static str {
    match err {
        UpstreamError::Status(_) => "status",
        UpstreamError::Timeout => "timeout",
        UpstreamError::Network(_) => "network",
    }
}
