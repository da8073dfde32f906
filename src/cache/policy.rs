//! Cacheability rules for fetched bodies.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::literal::ConfigFormatError;
use crate::config::schema::CacheConfig;

/// Client max-age used when no `max_time` is configured.
pub const DEFAULT_MAX_AGE_SECS: u64 = 86_400;

/// Resolved cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub min_cacheable_size_bytes: u64,
    /// Lower-case extensions without the dot.
    pub cacheable_extensions: HashSet<String>,
    /// Entry TTL. None = entries only leave through eviction.
    pub default_ttl: Option<Duration>,
    /// `max-age` advertised on served responses.
    pub max_age_secs: u64,
}

impl CacheSettings {
    /// Resolve the literals of a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigFormatError> {
        let ttl_secs = config.max_time.as_ref().map(|t| t.to_secs()).transpose()?;

        Ok(Self {
            enabled: config.enabled,
            max_size_bytes: config.max_size.to_bytes()?,
            min_cacheable_size_bytes: config.min_size.to_bytes()?,
            cacheable_extensions: config
                .image_types
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            default_ttl: ttl_secs.map(Duration::from_secs),
            max_age_secs: ttl_secs.unwrap_or(DEFAULT_MAX_AGE_SECS),
        })
    }

    /// Whether a body of `len` bytes fetched for `path` should be stored.
    pub fn is_cacheable(&self, path: &str, len: u64) -> bool {
        self.enabled
            && len >= self.min_cacheable_size_bytes
            && self.cacheable_extensions.contains(&extension_of(path))
    }
}

/// Final dot-segment of `path`, lower-cased.
///
/// A path without any dot yields the whole path, which never matches an
/// extension list.
pub fn extension_of(path: &str) -> String {
    path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase()
}
