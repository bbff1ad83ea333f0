//! Configuration file schema.
//!
//! All types derive Serde traits for deserialization from TOML. Durations are
//! expressed in milliseconds; zero leaves a limit unset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::builder::ServerOption;

/// Root of the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Listener configuration (bind address, header limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request header size in bytes.
    pub max_header_bytes: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_header_bytes: None,
        }
    }
}

/// Timeout configuration, all in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    pub read_ms: u64,
    pub read_header_ms: u64,
    pub write_ms: u64,
    pub idle_ms: u64,

    /// Graceful shutdown bound. Zero or negative selects the default.
    pub shutdown_ms: i64,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "graceful_http=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

impl FileConfig {
    /// The file's settings as ordered server adjustments.
    ///
    /// TLS is not included; certificate loading is asynchronous and done by the caller.
    pub fn options(&self) -> Vec<ServerOption> {
        let timeouts = &self.timeouts;
        let mut options = vec![
            ServerOption::ReadTimeout(Duration::from_millis(timeouts.read_ms)),
            ServerOption::ReadHeaderTimeout(Duration::from_millis(timeouts.read_header_ms)),
            ServerOption::WriteTimeout(Duration::from_millis(timeouts.write_ms)),
            ServerOption::IdleTimeout(Duration::from_millis(timeouts.idle_ms)),
            ServerOption::ShutdownTimeout(Duration::from_millis(timeouts.shutdown_ms.max(0) as u64)),
        ];
        if let Some(bytes) = self.listener.max_header_bytes {
            options.push(ServerOption::MaxHeaderBytes(bytes));
        }
        options
    }
}
