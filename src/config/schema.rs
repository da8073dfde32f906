//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Keys of the legacy JSON layout (`httpProxy`, `rawRedirect`, ...) are
//! accepted as aliases so an existing `index_config.json` loads unchanged.

use serde::{Deserialize, Serialize};

use crate::config::literal::{SizeLiteral, TimeLiteral};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service title shown in the status report.
    pub title: String,

    /// Service description shown in the status report.
    pub description: String,

    /// Footer text shown in the status report.
    pub footer: String,

    /// When the site went live, as `Y/M/D/H/M`.
    #[serde(alias = "establishTime")]
    pub establish_time: Option<String>,

    /// Directory holding `index.html` and `favicon.ico`.
    #[serde(alias = "publicDir")]
    pub public_dir: String,

    /// Ordered proxy rules. First matching prefix wins.
    pub proxies: Vec<ProxyRule>,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Optional forward proxy used for upstream fetches.
    #[serde(alias = "httpProxy")]
    pub http_proxy: HttpProxyConfig,

    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            title: "CDN Proxy".to_string(),
            description: "Multi-origin caching reverse proxy".to_string(),
            footer: String::new(),
            establish_time: None,
            public_dir: "public".to_string(),
            proxies: Vec::new(),
            cache: CacheConfig::default(),
            http_proxy: HttpProxyConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// A path-prefix rule mapping requests onto an upstream base URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProxyRule {
    /// Path prefix selecting this rule (literal, case-sensitive).
    pub prefix: String,

    /// Base URL the rest of the path is resolved against.
    pub target: String,

    /// Whether the global forward proxy applies to this rule.
    #[serde(default = "default_true", alias = "useProxy")]
    pub use_proxy: bool,

    /// Redirect template with a `{path}` placeholder, used for `?raw=true`.
    #[serde(default, alias = "rawRedirect")]
    pub raw_redirect: Option<String>,

    /// Whether the rule is listed in the status report.
    #[serde(default = "default_true")]
    pub visible: bool,

    /// Free-form description for the status report.
    #[serde(default)]
    pub description: Option<String>,
}

impl ProxyRule {
    /// Rule with defaults for every optional field.
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
            use_proxy: true,
            raw_redirect: None,
            visible: true,
            description: None,
        }
    }

    /// Set the redirect template.
    pub fn with_raw_redirect(mut self, template: impl Into<String>) -> Self {
        self.raw_redirect = Some(template.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// Cache configuration as written in the config file.
///
/// Literals are resolved into [`crate::cache::CacheSettings`] at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching of fetched bodies.
    pub enabled: bool,

    /// Total byte budget, e.g. "1024MB".
    #[serde(alias = "maxSize")]
    pub max_size: SizeLiteral,

    /// Smallest body worth caching, e.g. "8MB".
    #[serde(alias = "minSize")]
    pub min_size: SizeLiteral,

    /// Entry TTL and client max-age, e.g. "86400S". None = entries never expire.
    #[serde(alias = "maxTime")]
    pub max_time: Option<TimeLiteral>,

    /// Lower-case file extensions eligible for caching.
    #[serde(alias = "imageTypes")]
    pub image_types: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: SizeLiteral::from("1024MB"),
            min_size: SizeLiteral::from("8MB"),
            max_time: None,
            image_types: ["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Forward proxy for upstream fetches.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpProxyConfig {
    /// Route upstream fetches through the forward proxy.
    pub enabled: bool,

    /// Proxy host or URL (e.g. "10.0.0.1" or "http://proxy.local").
    pub address: String,

    /// Proxy port. Omitted = taken from `address` or the scheme default.
    pub port: Option<u16>,

    /// Basic auth user name.
    pub username: Option<String>,

    /// Basic auth password.
    pub password: Option<String>,
}

impl HttpProxyConfig {
    /// Proxy URL as handed to the HTTP client.
    pub fn proxy_url(&self) -> String {
        let base = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        };
        match self.port {
            Some(port) => format!("{}:{}", base.trim_end_matches('/'), port),
            None => base,
        }
    }

    /// `address[:port]` for display.
    pub fn display_address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.address, port),
            None => self.address.clone(),
        }
    }
}

/// Timeout configuration for upstream fetches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total upstream fetch timeout in seconds. None = wait indefinitely.
    pub upstream_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            upstream_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Number of recent log lines kept for `/logs`.
    pub log_buffer_lines: usize,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_buffer_lines: 2000,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
