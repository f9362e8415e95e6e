//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Pick protocol handler → Spawn server
//!
//! Shutdown (shutdown.rs):
//!     close() → Trigger → Accept loop exits → Drain handlers → Return
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary calls close()
//! ```
//!
//! # Design Decisions
//! - The server never installs signal handlers; the hosting process does
//! - Ordered shutdown: stop accept, drain, return

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::start;
