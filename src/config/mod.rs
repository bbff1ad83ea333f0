//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Programmatic:
//!     address + handler + [ServerOption...]
//!     → builder.rs (apply in order, last write wins)
//!     → build() (normalize shutdown timeout)
//!     → ServerConfig (immutable, shared via Arc)
//!
//! From a file (binary):
//!     config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FileConfig::options() → builder.rs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built
//! - All fields except address and handler have defaults
//! - Building never fails; bad addresses surface when the server starts

pub mod builder;
pub mod loader;
pub mod schema;
pub mod validation;

pub use builder::{ServerConfig, ServerConfigBuilder, ServerOption, DEFAULT_SHUTDOWN_TIMEOUT};
pub use loader::{load_config, ConfigError};
pub use schema::FileConfig;
