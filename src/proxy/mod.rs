//! Proxy core: dispatching a request to a cached or fetched response.
//!
//! # Data Flow
//! ```text
//! (path, query, method)
//!     → dispatcher.rs (rule match, redirect check, cache lookup)
//!     → upstream.rs (GET via direct or forward-proxy client)
//!     → response.rs (ResponseDescriptor: status, headers, body)
//!     → serving layer converts to an axum Response
//! ```
//!
//! # Error Mapping
//! - No rule: 404 `Not Found`
//! - Upstream non-2xx: same status, `Upstream Error`
//! - Upstream timeout: 504 `Gateway Timeout`
//! - Anything else: 500 `Internal Error`

pub mod dispatcher;
pub mod error;
pub mod response;
pub mod upstream;

pub use dispatcher::ProxyDispatcher;
pub use error::{ProxyError, UpstreamError};
pub use response::{CacheHeaders, ResponseBody, ResponseDescriptor, RouteOutcome};
pub use upstream::{HttpUpstream, Upstream, UpstreamResponse};
