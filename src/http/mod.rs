//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection (net/server.rs)
//!     → server.rs (hyper connection, timeouts, graceful close)
//!     → request.rs (connection info extension, request id)
//!     → router.rs (every request → greeting, 200 OK)
//!     → Send to client
//! ```

pub mod activity;
pub mod request;
pub mod router;
pub mod server;

pub use request::{ConnectionInfo, X_REQUEST_ID};
pub use router::build_router;
pub use server::HttpHandler;
