//! Outbound response description.
//!
//! The dispatcher never builds framework responses directly; it returns a
//! [`ResponseDescriptor`] which the serving layer turns into an axum
//! `Response`.

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// Content type used when the upstream sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of error bodies.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// CDN-targeted variant of `Cache-Control`.
pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

/// Terminal state of a proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    NotFound,
    Redirect,
    CacheHit,
    Fetched,
    UpstreamError,
}

impl RouteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOutcome::NotFound => "not_found",
            RouteOutcome::Redirect => "redirect",
            RouteOutcome::CacheHit => "cache_hit",
            RouteOutcome::Fetched => "fetched",
            RouteOutcome::UpstreamError => "upstream_error",
        }
    }
}

/// `Cache-Control` / `CDN-Cache-Control` pair attached to served content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeaders {
    max_age_secs: u64,
}

impl CacheHeaders {
    pub fn new(max_age_secs: u64) -> Self {
        Self { max_age_secs }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Insert both caching headers into `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", self.max_age_secs)) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", self.max_age_secs)) {
            headers.insert(CDN_CACHE_CONTROL, value);
        }
    }
}

/// Response body variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Payload(Bytes),
    Empty,
    Error(&'static str),
}

/// Status, headers and body for one proxied request.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
    pub outcome: RouteOutcome,
}

impl ResponseDescriptor {
    /// 200 with a payload and caching headers.
    pub fn payload(
        outcome: RouteOutcome,
        payload: Bytes,
        content_type: &str,
        cache_headers: &CacheHeaders,
    ) -> Self {
        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        headers.insert(header::CONTENT_TYPE, content_type);
        cache_headers.apply(&mut headers);

        Self {
            status: StatusCode::OK,
            headers,
            body: ResponseBody::Payload(payload),
            outcome,
        }
    }

    /// 302 to `location` with an empty body.
    pub fn redirect(location: &str) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_str(location)?);

        Ok(Self {
            status: StatusCode::FOUND,
            headers,
            body: ResponseBody::Empty,
            outcome: RouteOutcome::Redirect,
        })
    }

    /// Plain-text error response.
    pub fn error(status: StatusCode, message: &'static str, outcome: RouteOutcome) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));

        Self {
            status,
            headers,
            body: ResponseBody::Error(message),
            outcome,
        }
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Payload bytes, if this is a payload response.
    pub fn payload_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Payload(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl IntoResponse for ResponseDescriptor {
    fn into_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Payload(bytes) => Body::from(bytes),
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Error(message) => Body::from(message),
        };
        (self.status, self.headers, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_headers() {
        let d = ResponseDescriptor::payload(
            RouteOutcome::Fetched,
            Bytes::from_static(b"png"),
            "image/png",
            &CacheHeaders::new(3600),
        );
        assert_eq!(d.status, StatusCode::OK);
        assert_eq!(d.header(header::CONTENT_TYPE), Some("image/png"));
        assert_eq!(d.header(header::CACHE_CONTROL), Some("public, max-age=3600"));
        assert_eq!(d.header("cdn-cache-control"), Some("max-age=3600"));
        assert_eq!(d.payload_bytes(), Some(&Bytes::from_static(b"png")));
    }

    #[test]
    fn test_bad_content_type_falls_back() {
        let d = ResponseDescriptor::payload(
            RouteOutcome::Fetched,
            Bytes::new(),
            "bad\nvalue",
            &CacheHeaders::new(1),
        );
        assert_eq!(d.header(header::CONTENT_TYPE), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_redirect() {
        let d = ResponseDescriptor::redirect("https://cdn.example/x.png").unwrap();
        assert_eq!(d.status, StatusCode::FOUND);
        assert_eq!(d.header(header::LOCATION), Some("https://cdn.example/x.png"));
        assert_eq!(d.body, ResponseBody::Empty);
        assert!(d.header(header::CACHE_CONTROL).is_none());

        assert!(ResponseDescriptor::redirect("bad\nlocation").is_err());
    }

    #[test]
    fn test_error() {
        let d = ResponseDescriptor::error(StatusCode::NOT_FOUND, "Not Found", RouteOutcome::NotFound);
        assert_eq!(d.header(header::CONTENT_TYPE), Some(TEXT_PLAIN));
        assert_eq!(d.body, ResponseBody::Error("Not Found"));
        assert!(d.header(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_into_response() {
        let d = ResponseDescriptor::error(StatusCode::BAD_GATEWAY, "Upstream Error", RouteOutcome::UpstreamError);
        let response = d.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Upstream Error");
    }
}
