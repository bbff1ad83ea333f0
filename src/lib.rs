//! HTTP server wrapper with declarative configuration and bounded graceful shutdown.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::{ServerConfig, ServerConfigBuilder, ServerOption, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{EngineError, ServerError, ShutdownError};
pub use http::{Engine, HttpEngine};
pub use lifecycle::Server;
