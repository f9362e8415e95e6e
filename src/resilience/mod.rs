//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop:
//!     → transient accept error → backoff.rs (capped exponential delay) → retry
//!
//! Connection handler:
//!     → timeouts.rs (handler deadline, write deadline)
//! ```
//!
//! # Design Decisions
//! - A stuck peer cannot hold a handler forever when a deadline is configured
//! - Accept retries back off so resource exhaustion does not spin the loop

pub mod backoff;
pub mod timeouts;
