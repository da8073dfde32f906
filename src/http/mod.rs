//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (request ID, client address, public origin)
//!     → /, /favicon.ico, /list (status.rs), /logs
//!     → /{*path} → proxy::ProxyDispatcher → ResponseDescriptor
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod status;

pub use request::{RequestIdMaker, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use status::{StatusContext, StatusReport};
