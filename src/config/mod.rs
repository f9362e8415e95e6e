//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → ServerConfig handed to ConnectionServer::spawn
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server is spawned
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load_config, load_or_default, ConfigError};
pub use schema::AppConfig;
pub use schema::ObservabilityConfig;
pub use schema::Protocol;
pub use schema::ServerConfig;
