//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → CacheSettings + RuleTable + HttpUpstream → dispatcher
//!     public_dir → StaticAssets
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → server stops accepting → in-flight requests drain → exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{spawn_signal_listener, wait_for_signal};
pub use startup::{build_dispatcher, load_static_assets, StartupError, StaticAssets};
