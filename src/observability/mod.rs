//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop and handlers produce:
//!     → logging.rs (structured log events, connection_id / peer_addr fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Connection id flows through every per-connection log line
//! - Metrics are cheap (atomic increments) and off unless an exporter is installed

pub mod logging;
pub mod metrics;
