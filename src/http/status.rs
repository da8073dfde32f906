//! `GET /list` status report.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cache::CacheStats;
use crate::config::schema::{HttpProxyConfig, ProxyConfig, ProxyRule};
use crate::config::format_size;

const SECS_PER_DAY: u64 = 86_400;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: String,
    pub establish_time: Option<String>,
    pub cache_days: u64,
    pub site: SiteInfo,
    pub forward_proxy: ForwardProxyStatus,
    pub proxies: Vec<RuleStatus>,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    pub footer: String,
}

/// Forward-proxy summary. Credentials are reported as present or not, never echoed.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardProxyStatus {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_configured: Option<bool>,
}

impl ForwardProxyStatus {
    fn from_config(config: &HttpProxyConfig) -> Self {
        if config.enabled {
            Self {
                enabled: true,
                address: Some(config.display_address()),
                auth_configured: Some(config.username.is_some()),
            }
        } else {
            Self {
                enabled: false,
                address: None,
                auth_configured: None,
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RuleStatus {
    pub prefix: String,
    pub target: String,
    pub description: Option<String>,
    pub raw_redirect: Option<String>,
    pub use_proxy: bool,
    pub examples: UsageExamples,
}

#[derive(Debug, Serialize)]
pub struct UsageExamples {
    pub proxied: String,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub enabled: bool,
    pub entries: usize,
    pub size: String,
    pub max_size: String,
    pub size_bytes: u64,
    pub max_size_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Static inputs of the report, captured once at startup.
#[derive(Debug, Clone)]
pub struct StatusContext {
    started_at: Instant,
    establish_time: Option<String>,
    site: SiteInfo,
    forward_proxy: ForwardProxyStatus,
    rules: Vec<ProxyRule>,
}

impl StatusContext {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            started_at: Instant::now(),
            establish_time: config
                .establish_time
                .as_deref()
                .and_then(format_establish_time),
            site: SiteInfo {
                title: config.title.clone(),
                description: config.description.clone(),
                footer: config.footer.clone(),
            },
            forward_proxy: ForwardProxyStatus::from_config(&config.http_proxy),
            rules: config.proxies.iter().filter(|r| r.visible).cloned().collect(),
        }
    }

    /// Build the report. `origin` is the scheme and host the client used.
    pub fn report(
        &self,
        origin: &str,
        max_age_secs: u64,
        cache_enabled: bool,
        stats: &CacheStats,
    ) -> StatusReport {
        let proxies = self
            .rules
            .iter()
            .map(|rule| RuleStatus {
                prefix: rule.prefix.clone(),
                target: rule.target.clone(),
                description: rule.description.clone(),
                raw_redirect: rule.raw_redirect.clone(),
                use_proxy: rule.use_proxy,
                examples: UsageExamples {
                    proxied: format!("{}{}", origin, rule.prefix),
                    redirect: format!("{}{}?raw=true", origin, rule.prefix),
                },
            })
            .collect();

        StatusReport {
            status: "running",
            version: env!("CARGO_PKG_VERSION"),
            uptime: format_uptime(self.started_at.elapsed()),
            establish_time: self.establish_time.clone(),
            cache_days: max_age_secs / SECS_PER_DAY,
            site: self.site.clone(),
            forward_proxy: self.forward_proxy.clone(),
            proxies,
            cache: CacheStatus {
                enabled: cache_enabled,
                entries: stats.entries,
                size: format_size(stats.size_bytes),
                max_size: format_size(stats.max_size_bytes),
                size_bytes: stats.size_bytes,
                max_size_bytes: stats.max_size_bytes,
                hits: stats.hits,
                misses: stats.misses,
                evictions: stats.evictions,
            },
        }
    }
}

/// `3d 4h 5m`; zero days and hours are omitted, minutes always shown.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / 3600;
    let minutes = (secs % 3600) / 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{}d ", days));
    }
    if hours > 0 {
        out.push_str(&format!("{}h ", hours));
    }
    out.push_str(&format!("{}m", minutes));
    out
}

/// `Y/M/D/H/M` to `YYYY-MM-DD HH:MM`. Malformed input yields `None`.
pub fn format_establish_time(raw: &str) -> Option<String> {
    let parts = raw
        .split('/')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    match parts.as_slice() {
        [year, month, day, hour, minute]
            if (1..=12).contains(month) && (1..=31).contains(day) && *hour < 24 && *minute < 60 =>
        {
            Some(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}",
                year, month, day, hour, minute
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0m");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 120)), "3h 2m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86_400 + 60)), "2d 1m");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3600 + 60)),
            "1d 1h 1m"
        );
    }

    #[test]
    fn test_format_establish_time() {
        assert_eq!(
            format_establish_time("2025/1/2/3/4").as_deref(),
            Some("2025-01-02 03:04")
        );
        assert_eq!(format_establish_time("2025/13/2/3/4"), None);
        assert_eq!(format_establish_time("2025/1/2"), None);
        assert_eq!(format_establish_time("yesterday"), None);
    }

    #[test]
    fn test_report_hides_credentials_and_invisible_rules() {
        let mut config = ProxyConfig::default();
        config.title = "Mirror".into();
        config.http_proxy = HttpProxyConfig {
            enabled: true,
            address: "10.0.0.1".into(),
            port: Some(8080),
            username: Some("user".into()),
            password: Some("hunter2".into()),
        };
        let mut hidden = ProxyRule::new("/hidden", "https://hidden.example/");
        hidden.visible = false;
        config.proxies = vec![ProxyRule::new("/img", "https://img.example/"), hidden];

        let ctx = StatusContext::from_config(&config);
        let stats = CacheStats {
            entries: 1,
            size_bytes: 2048,
            max_size_bytes: 1024 * 1024,
            ..Default::default()
        };
        let report = ctx.report("http://localhost:3000", 2 * 86_400, true, &stats);

        assert_eq!(report.cache_days, 2);
        assert_eq!(report.proxies.len(), 1);
        assert_eq!(report.proxies[0].examples.proxied, "http://localhost:3000/img");
        assert_eq!(
            report.proxies[0].examples.redirect,
            "http://localhost:3000/img?raw=true"
        );
        assert_eq!(report.cache.size, "2.00KB");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"address\":\"10.0.0.1:8080\""));
        assert!(json.contains("\"auth_configured\":true"));
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("/hidden"));
    }
}
