//! CDN-style caching reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing (first-match prefix)
//!                          │                 │
//!                          │                 ▼
//!                          │         proxy::dispatcher ──raw=true──▶ 302 Location
//!                          │                 │
//!                          │                 ▼
//!                          │         cache::BoundedCache ──hit──▶ 200 from memory
//!                          │                 │ miss
//!                          │                 ▼
//!                          │         proxy::upstream (direct or forward proxy)
//!                          │                 │
//!     Client Response ◀────┴── ResponseDescriptor ◀── maybe cache ◀──┘
//!
//!     Cross-cutting: config, observability (logs, /logs ring, metrics), lifecycle
//! ```

// Core subsystems
pub mod cache;
pub mod config;
pub mod http;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
