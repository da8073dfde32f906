//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check rule prefixes and upstream targets
//! - Resolve size/time literals so malformed ones fail at startup
//! - Check the forward proxy and listener settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::literal::ConfigFormatError;
use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address {0:?}")]
    BindAddress(String),

    #[error("proxy rule #{index}: prefix {prefix:?} must start with '/'")]
    Prefix { index: usize, prefix: String },

    #[error("proxy rule #{index}: target {target:?} is not an absolute http(s) URL")]
    Target { index: usize, target: String },

    #[error("http_proxy is enabled but has no address")]
    ProxyAddress,

    #[error("cache.{field}: {source}")]
    Literal {
        field: &'static str,
        source: ConfigFormatError,
    },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    for (index, rule) in config.proxies.iter().enumerate() {
        if !rule.prefix.starts_with('/') {
            errors.push(ValidationError::Prefix {
                index,
                prefix: rule.prefix.clone(),
            });
        }

        let target_ok = Url::parse(&rule.target)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !target_ok {
            errors.push(ValidationError::Target {
                index,
                target: rule.target.clone(),
            });
        }
    }

    if config.http_proxy.enabled && config.http_proxy.address.trim().is_empty() {
        errors.push(ValidationError::ProxyAddress);
    }

    let cache = &config.cache;
    if let Err(source) = cache.max_size.to_bytes() {
        errors.push(ValidationError::Literal { field: "max_size", source });
    }
    if let Err(source) = cache.min_size.to_bytes() {
        errors.push(ValidationError::Literal { field: "min_size", source });
    }
    if let Some(Err(source)) = cache.max_time.as_ref().map(|t| t.to_secs()) {
        errors.push(ValidationError::Literal { field: "max_time", source });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
