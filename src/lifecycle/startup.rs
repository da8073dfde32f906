//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated `ProxyConfig` into runtime components
//! - Load the static homepage and favicon from the public directory
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Missing static files are not errors; their routes answer 503 / 404

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::cache::{BoundedCache, CacheSettings};
use crate::config::{format_size, ConfigFormatError, ProxyConfig};
use crate::proxy::{HttpUpstream, ProxyDispatcher};
use crate::routing::{RoutingError, RuleTable};

/// Failure building runtime components from config.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid cache settings: {0}")]
    Cache(#[from] ConfigFormatError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("cannot build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Build the dispatcher with its cache, rule table and upstream client.
pub fn build_dispatcher(config: &ProxyConfig) -> Result<ProxyDispatcher<HttpUpstream>, StartupError> {
    let settings = CacheSettings::from_config(&config.cache)?;
    let rules = RuleTable::from_config(&config.proxies)?;
    let upstream = HttpUpstream::from_config(&config.http_proxy, &config.timeouts)?;
    let cache = Arc::new(BoundedCache::new(settings.max_size_bytes));

    if settings.min_cacheable_size_bytes > settings.max_size_bytes {
        tracing::warn!(
            min_size = %format_size(settings.min_cacheable_size_bytes),
            max_size = %format_size(settings.max_size_bytes),
            "Cache min size exceeds max size; nothing will be cached"
        );
    }

    tracing::info!(
        rules = rules.len(),
        cache_enabled = settings.enabled,
        max_size = %format_size(settings.max_size_bytes),
        min_size = %format_size(settings.min_cacheable_size_bytes),
        ttl_secs = settings.default_ttl.map(|ttl| ttl.as_secs()),
        forward_proxy = config.http_proxy.enabled,
        "Dispatcher initialized"
    );

    Ok(ProxyDispatcher::new(rules, cache, settings, upstream))
}

/// Files served from the public directory.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    pub homepage: Option<String>,
    pub favicon: Option<Bytes>,
}

/// Read `index.html` and `favicon.ico` from `dir`, logging what is missing.
pub async fn load_static_assets(dir: impl AsRef<Path>) -> StaticAssets {
    let dir = dir.as_ref();

    let homepage = match tokio::fs::read_to_string(dir.join("index.html")).await {
        Ok(html) => Some(html),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Homepage not loaded");
            None
        }
    };

    let favicon = match tokio::fs::read(dir.join("favicon.ico")).await {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Favicon not loaded");
            None
        }
    };

    StaticAssets { homepage, favicon }
}
