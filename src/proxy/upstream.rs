//! Upstream fetching.
//!
//! # Responsibilities
//! - Issue the GET for a resolved upstream URL and buffer the body
//! - Route through the optional forward proxy (with basic auth) per rule
//! - Classify failures (status, timeout, network)

use std::future::Future;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use url::Url;

use crate::config::schema::{HttpProxyConfig, TimeoutConfig};
use crate::proxy::error::UpstreamError;

/// A successful upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Something that can fetch a resource by URL.
pub trait Upstream: Send + Sync + 'static {
    /// Fetch `url`, going through the forward proxy when `use_proxy` is set
    /// and one is configured. Non-2xx responses are errors.
    fn fetch(
        &self,
        url: &Url,
        use_proxy: bool,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}

/// reqwest-backed upstream with an optional forward proxy.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    direct: reqwest::Client,
    proxied: Option<reqwest::Client>,
}

impl HttpUpstream {
    /// Build the direct client and, if enabled, the forward-proxy client.
    pub fn from_config(
        proxy: &HttpProxyConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, reqwest::Error> {
        let direct = client_builder(timeouts).no_proxy().build()?;

        let proxied = if proxy.enabled {
            let mut forward = reqwest::Proxy::all(proxy.proxy_url())?;
            if let Some(username) = &proxy.username {
                forward = forward.basic_auth(username, proxy.password.as_deref().unwrap_or_default());
            }
            tracing::info!(
                proxy = %proxy.display_address(),
                auth = proxy.username.is_some(),
                "Upstream forward proxy configured"
            );
            Some(client_builder(timeouts).proxy(forward).build()?)
        } else {
            None
        };

        Ok(Self { direct, proxied })
    }

    /// Whether a fetch with this `use_proxy` flag goes through the forward proxy.
    pub fn routes_via_proxy(&self, use_proxy: bool) -> bool {
        use_proxy && self.proxied.is_some()
    }

    fn client(&self, use_proxy: bool) -> &reqwest::Client {
        match &self.proxied {
            Some(proxied) if use_proxy => proxied,
            _ => &self.direct,
        }
    }
}

fn client_builder(timeouts: &TimeoutConfig) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .user_agent(concat!("cdn-proxy/", env!("CARGO_PKG_VERSION")));

    match timeouts.upstream_secs {
        Some(secs) => builder.timeout(Duration::from_secs(secs)),
        None => builder,
    }
}

impl Upstream for HttpUpstream {
    async fn fetch(&self, url: &Url, use_proxy: bool) -> Result<UpstreamResponse, UpstreamError> {
        if self.routes_via_proxy(use_proxy) {
            tracing::debug!(upstream = %url, "Fetching through forward proxy");
        }

        let response = self.client(use_proxy).get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Ok(UpstreamResponse { body, content_type })
    }
}
