//! Per-request error types and their HTTP mapping.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use thiserror::Error;

/// Failure fetching from the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned {0}")]
    Status(StatusCode),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Network(#[source] reqwest::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Network(err)
        }
    }
}

/// Anything that stops a request from being served normally.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no proxy rule matches {0}")]
    NoMatchingRule(String),

    #[error("cannot build upstream URL: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("redirect location is not a valid header value: {0}")]
    RedirectLocation(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoMatchingRule(_) => StatusCode::NOT_FOUND,
            ProxyError::Upstream(UpstreamError::Status(status)) => *status,
            ProxyError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(UpstreamError::Network(_))
            | ProxyError::UpstreamUrl(_)
            | ProxyError::RedirectLocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Opaque body sent to the client.
    pub fn body(&self) -> &'static str {
        match self {
            ProxyError::NoMatchingRule(_) => "Not Found",
            ProxyError::Upstream(UpstreamError::Status(_)) => "Upstream Error",
            ProxyError::Upstream(UpstreamError::Timeout) => "Gateway Timeout",
            ProxyError::Upstream(UpstreamError::Network(_))
            | ProxyError::UpstreamUrl(_)
            | ProxyError::RedirectLocation(_) => "Internal Error",
        }
    }
}
