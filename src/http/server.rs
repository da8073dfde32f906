//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve the homepage, favicon, `/list` and `/logs`
//! - Hand every other GET/HEAD to the proxy dispatcher
//! - Fall back to files under `public_dir` for paths no proxy rule claims
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::request::{client_ip, public_origin, request_id, RequestIdMaker};
use crate::http::status::StatusContext;
use crate::lifecycle::{build_dispatcher, load_static_assets, ShutdownSignal, StartupError, StaticAssets};
use crate::observability::{metrics, RecentLogs};
use crate::proxy::response::TEXT_PLAIN;
use crate::proxy::{CacheHeaders, HttpUpstream, ProxyDispatcher};
use crate::routing::rewrite::parse_query;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const IMAGE_ICON: &str = "image/x-icon";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ProxyDispatcher<HttpUpstream>>,
    pub status: Arc<StatusContext>,
    pub assets: Arc<StaticAssets>,
    pub public: ServeDir,
    pub logs: RecentLogs,
}

impl AppState {
    fn cache_headers(&self) -> &CacheHeaders {
        self.dispatcher.cache_headers()
    }
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Build all components and load static assets from `public_dir`.
    pub async fn new(config: ProxyConfig, logs: RecentLogs) -> Result<Self, StartupError> {
        let assets = load_static_assets(&config.public_dir).await;
        Self::with_assets(config, assets, logs)
    }

    /// Build all components with the given static assets.
    pub fn with_assets(
        config: ProxyConfig,
        assets: StaticAssets,
        logs: RecentLogs,
    ) -> Result<Self, StartupError> {
        let dispatcher = Arc::new(build_dispatcher(&config)?);

        let state = AppState {
            dispatcher,
            status: Arc::new(StatusContext::from_config(&config)),
            assets: Arc::new(assets),
            public: ServeDir::new(&config.public_dir),
            logs,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(homepage_handler))
            .route("/favicon.ico", get(favicon_handler))
            .route("/list", get(list_handler))
            .route("/logs", get(logs_handler))
            .route("/{*path}", get(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(RequestIdMaker))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.config.proxies.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn cached_content(content_type: &'static str, cache_headers: &CacheHeaders) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    cache_headers.apply(&mut headers);
    headers
}

fn plain_text(status: StatusCode, message: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], message).into_response()
}

async fn homepage_handler(State(state): State<AppState>) -> Response {
    match &state.assets.homepage {
        Some(html) => (
            cached_content(TEXT_HTML, state.cache_headers()),
            html.clone(),
        )
            .into_response(),
        None => plain_text(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable"),
    }
}

async fn favicon_handler(State(state): State<AppState>) -> Response {
    match &state.assets.favicon {
        Some(icon) => (
            cached_content(IMAGE_ICON, state.cache_headers()),
            icon.clone(),
        )
            .into_response(),
        None => plain_text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn list_handler(State(state): State<AppState>, request: Request) -> Response {
    let dispatcher = &state.dispatcher;
    let report = state.status.report(
        &public_origin(&request),
        dispatcher.cache_headers().max_age_secs(),
        dispatcher.settings().enabled,
        &dispatcher.cache().stats(),
    );

    let mut headers = HeaderMap::new();
    state.cache_headers().apply(&mut headers);
    (headers, Json(report)).into_response()
}

async fn logs_handler(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        state.logs.render(),
    )
        .into_response()
}

/// Serve `request` from the public directory. `None` when no file matches.
async fn serve_public(public: &ServeDir, request: Request<Body>) -> Option<Response> {
    let response = public
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    if response.status() == StatusCode::NOT_FOUND {
        return None;
    }
    Some(response.map(Body::new))
}

/// Main proxy handler. Proxy rules win over files in the public directory.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    let path = request.uri().path().to_string();
    let query = parse_query(request.uri().query());
    let method = request.method().clone();

    tracing::info!(
        client = %client_ip(&request),
        referer = request
            .headers()
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
        "Incoming request"
    );

    if !state.dispatcher.handles(&path) {
        if let Some(response) = serve_public(&state.public, request).await {
            let status = response.status().as_u16();
            metrics::record_request(method.as_str(), status, "static", start_time);
            tracing::info!(status, outcome = "static", "Request complete");
            return response;
        }
    }

    let response = state.dispatcher.route(&path, &query, &method).await;

    metrics::record_request(
        method.as_str(),
        response.status.as_u16(),
        response.outcome.as_str(),
        start_time,
    );
    tracing::info!(
        status = response.status.as_u16(),
        outcome = response.outcome.as_str(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request complete"
    );

    response.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request};
    use bytes::Bytes;

    use crate::config::ProxyRule;

    fn server(config: ProxyConfig, assets: StaticAssets) -> HttpServer {
        HttpServer::with_assets(config, assets, RecentLogs::new(100)).unwrap()
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "cdn.example")
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_homepage() {
        let assets = StaticAssets {
            homepage: Some("<h1>cdn</h1>".into()),
            favicon: Some(Bytes::from_static(b"ico")),
        };
        let router = server(ProxyConfig::default(), assets).router();

        let response = send(router.clone(), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_HTML);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=86400");
        assert_eq!(response.headers()["cdn-cache-control"], "max-age=86400");
        assert_eq!(body_text(response).await, "<h1>cdn</h1>");

        let response = send(router, Method::GET, "/favicon.ico").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], IMAGE_ICON);
    }

    #[tokio::test]
    async fn test_missing_assets() {
        let router = server(ProxyConfig::default(), StaticAssets::default()).router();

        let response = send(router.clone(), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "Service Unavailable");

        let response = send(router, Method::GET, "/favicon.ico").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_list_report() {
        let mut config = ProxyConfig::default();
        config.title = "Mirror".into();
        config.proxies.push(ProxyRule::new("/gh/", "https://raw.example/"));
        let router = server(config, StaticAssets::default()).router();

        let response = send(router, Method::GET, "/list").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::CACHE_CONTROL));

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["cache_days"], 1);
        assert_eq!(json["site"]["title"], "Mirror");
        assert_eq!(json["forward_proxy"]["enabled"], false);
        assert_eq!(json["proxies"][0]["examples"]["proxied"], "http://cdn.example/gh/");
        assert_eq!(json["cache"]["entries"], 0);
    }

    #[tokio::test]
    async fn test_unmatched_path_and_request_id() {
        let router = server(ProxyConfig::default(), StaticAssets::default()).router();

        let response = send(router, Method::GET, "/nothing/here.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(body_text(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_inbound_request_id_kept() {
        let router = server(ProxyConfig::default(), StaticAssets::default()).router();
        let request = Request::builder()
            .uri("/nothing")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_only_get_and_head_routed() {
        let router = server(ProxyConfig::default(), StaticAssets::default()).router();

        let response = send(router.clone(), Method::POST, "/img/a.png").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = send(router, Method::HEAD, "/img/a.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_dir_fallback() {
        let public = tempfile::tempdir().unwrap();
        std::fs::write(public.path().join("style.css"), "body{}").unwrap();
        std::fs::create_dir(public.path().join("img")).unwrap();
        std::fs::write(public.path().join("img").join("a.png"), "local").unwrap();

        // Nothing listens on this port, so a proxied request fails with 500.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut config = ProxyConfig::default();
        config.public_dir = public.path().to_string_lossy().into_owned();
        config
            .proxies
            .push(ProxyRule::new("/img/", format!("http://127.0.0.1:{}/", port)));
        let router = server(config, StaticAssets::default()).router();

        let response = send(router.clone(), Method::GET, "/style.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert_eq!(body_text(response).await, "body{}");

        let response = send(router.clone(), Method::GET, "/img/a.png").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Error");

        let response = send(router, Method::GET, "/missing.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_logs_endpoint() {
        let logs = RecentLogs::new(10);
        logs.push("first line".into());
        let router = HttpServer::with_assets(ProxyConfig::default(), StaticAssets::default(), logs)
            .unwrap()
            .router();

        let response = send(router, Method::GET, "/logs").await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(body_text(response).await, "first line\n");
    }
}
