//! Declarative server configuration.
//!
//! A [`ServerConfig`] is assembled from a required address and handler plus
//! any number of adjustments, either as fluent [`ServerConfigBuilder`] calls or
//! as an ordered list of [`ServerOption`]s. Adjustments apply in order and the
//! last write to a field wins. Nothing here can fail; an unusable address is
//! reported when the server starts.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use crate::http::context::{BaseContextFn, ConnContextFn};
use crate::http::negotiation::NegotiationTable;
use crate::net::ConnStateFn;
use crate::observability::{DiagnosticLog, Diagnostics};

/// Shutdown timeout used when none (or zero) is configured.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// A single configuration adjustment. Each variant sets exactly one field.
#[derive(Clone)]
pub enum ServerOption {
    Tls(RustlsConfig),
    ReadTimeout(Duration),
    ReadHeaderTimeout(Duration),
    WriteTimeout(Duration),
    IdleTimeout(Duration),
    MaxHeaderBytes(usize),
    NegotiationTable(NegotiationTable),
    ConnState(ConnStateFn),
    ErrorLog(Arc<dyn DiagnosticLog>),
    BaseContext(BaseContextFn),
    ConnContext(ConnContextFn),
    ShutdownTimeout(Duration),
}

impl fmt::Debug for ServerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerOption::Tls(_) => f.write_str("Tls(..)"),
            ServerOption::ReadTimeout(d) => f.debug_tuple("ReadTimeout").field(d).finish(),
            ServerOption::ReadHeaderTimeout(d) => f.debug_tuple("ReadHeaderTimeout").field(d).finish(),
            ServerOption::WriteTimeout(d) => f.debug_tuple("WriteTimeout").field(d).finish(),
            ServerOption::IdleTimeout(d) => f.debug_tuple("IdleTimeout").field(d).finish(),
            ServerOption::MaxHeaderBytes(n) => f.debug_tuple("MaxHeaderBytes").field(n).finish(),
            ServerOption::NegotiationTable(table) => f
                .debug_tuple("NegotiationTable")
                .field(&table.keys().collect::<Vec<_>>())
                .finish(),
            ServerOption::ConnState(_) => f.write_str("ConnState(..)"),
            ServerOption::ErrorLog(_) => f.write_str("ErrorLog(..)"),
            ServerOption::BaseContext(_) => f.write_str("BaseContext(..)"),
            ServerOption::ConnContext(_) => f.write_str("ConnContext(..)"),
            ServerOption::ShutdownTimeout(d) => f.debug_tuple("ShutdownTimeout").field(d).finish(),
        }
    }
}

/// Immutable server configuration, produced by [`ServerConfigBuilder::build`].
#[derive(Clone)]
pub struct ServerConfig {
    address: String,
    handler: Router,
    tls: Option<RustlsConfig>,
    read_timeout: Option<Duration>,
    read_header_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    max_header_bytes: Option<usize>,
    negotiation: NegotiationTable,
    conn_state: Option<ConnStateFn>,
    error_log: Option<Arc<dyn DiagnosticLog>>,
    base_context: Option<BaseContextFn>,
    conn_context: Option<ConnContextFn>,
    shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn builder(address: impl Into<String>, handler: Router) -> ServerConfigBuilder {
        ServerConfigBuilder::new(address, handler)
    }

    /// Build a configuration from an ordered list of adjustments.
    pub fn new(
        address: impl Into<String>,
        handler: Router,
        options: impl IntoIterator<Item = ServerOption>,
    ) -> Self {
        ServerConfigBuilder::new(address, handler).options(options).build()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn handler(&self) -> &Router {
        &self.handler
    }

    pub fn tls(&self) -> Option<&RustlsConfig> {
        self.tls.as_ref()
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn read_header_timeout(&self) -> Option<Duration> {
        self.read_header_timeout
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn max_header_bytes(&self) -> Option<usize> {
        self.max_header_bytes
    }

    pub fn negotiation_table(&self) -> &NegotiationTable {
        &self.negotiation
    }

    pub fn conn_state(&self) -> Option<&ConnStateFn> {
        self.conn_state.as_ref()
    }

    pub fn error_log(&self) -> Option<&Arc<dyn DiagnosticLog>> {
        self.error_log.as_ref()
    }

    /// The diagnostic sink as a reporting handle; reports are dropped without a sink.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.error_log.clone())
    }

    pub fn base_context(&self) -> Option<&BaseContextFn> {
        self.base_context.as_ref()
    }

    pub fn conn_context(&self) -> Option<&ConnContextFn> {
        self.conn_context.as_ref()
    }

    /// Bound on graceful draining. Always greater than zero.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("address", &self.address)
            .field("tls", &self.tls.is_some())
            .field("read_timeout", &self.read_timeout)
            .field("read_header_timeout", &self.read_header_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("max_header_bytes", &self.max_header_bytes)
            .field("negotiation", &self.negotiation.keys().collect::<Vec<_>>())
            .field("conn_state", &self.conn_state.is_some())
            .field("error_log", &self.error_log.is_some())
            .field("base_context", &self.base_context.is_some())
            .field("conn_context", &self.conn_context.is_some())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

/// Mutable, in-progress configuration.
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new(address: impl Into<String>, handler: Router) -> Self {
        Self {
            config: ServerConfig {
                address: address.into(),
                handler,
                tls: None,
                read_timeout: None,
                read_header_timeout: None,
                write_timeout: None,
                idle_timeout: None,
                max_header_bytes: None,
                negotiation: NegotiationTable::new(),
                conn_state: None,
                error_log: None,
                base_context: None,
                conn_context: None,
                shutdown_timeout: Duration::ZERO,
            },
        }
    }

    /// Serve over TLS with the given rustls configuration.
    pub fn tls(mut self, tls: RustlsConfig) -> Self {
        self.config.tls = Some(tls);
        self
    }

    /// Deadline for reading a whole request. Zero disables it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = limit(timeout);
        self
    }

    /// Deadline for reading request headers. Zero disables it.
    pub fn read_header_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_header_timeout = limit(timeout);
        self
    }

    /// Deadline for producing a response. Zero disables it.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = limit(timeout);
        self
    }

    /// How long a keep-alive connection may wait for its next request. Zero disables it.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = limit(timeout);
        self
    }

    /// Maximum request header size. Zero restores the engine default.
    pub fn max_header_bytes(mut self, bytes: usize) -> Self {
        self.config.max_header_bytes = (bytes > 0).then_some(bytes);
        self
    }

    pub fn negotiation_table(mut self, table: NegotiationTable) -> Self {
        self.config.negotiation = table;
        self
    }

    pub fn conn_state(mut self, observer: ConnStateFn) -> Self {
        self.config.conn_state = Some(observer);
        self
    }

    pub fn error_log(mut self, sink: Arc<dyn DiagnosticLog>) -> Self {
        self.config.error_log = Some(sink);
        self
    }

    pub fn base_context(mut self, factory: BaseContextFn) -> Self {
        self.config.base_context = Some(factory);
        self
    }

    pub fn conn_context(mut self, factory: ConnContextFn) -> Self {
        self.config.conn_context = Some(factory);
        self
    }

    /// Bound on graceful draining. Zero selects [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Apply a single adjustment.
    pub fn option(self, option: ServerOption) -> Self {
        match option {
            ServerOption::Tls(tls) => self.tls(tls),
            ServerOption::ReadTimeout(d) => self.read_timeout(d),
            ServerOption::ReadHeaderTimeout(d) => self.read_header_timeout(d),
            ServerOption::WriteTimeout(d) => self.write_timeout(d),
            ServerOption::IdleTimeout(d) => self.idle_timeout(d),
            ServerOption::MaxHeaderBytes(n) => self.max_header_bytes(n),
            ServerOption::NegotiationTable(table) => self.negotiation_table(table),
            ServerOption::ConnState(observer) => self.conn_state(observer),
            ServerOption::ErrorLog(sink) => self.error_log(sink),
            ServerOption::BaseContext(factory) => self.base_context(factory),
            ServerOption::ConnContext(factory) => self.conn_context(factory),
            ServerOption::ShutdownTimeout(d) => self.shutdown_timeout(d),
        }
    }

    /// Apply adjustments in order.
    pub fn options(self, options: impl IntoIterator<Item = ServerOption>) -> Self {
        options.into_iter().fold(self, Self::option)
    }

    /// Freeze the configuration, normalizing the shutdown timeout.
    pub fn build(mut self) -> ServerConfig {
        if self.config.shutdown_timeout.is_zero() {
            self.config.shutdown_timeout = DEFAULT_SHUTDOWN_TIMEOUT;
        }
        self.config
    }
}

fn limit(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::TracingLog;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("127.0.0.1:0", Router::new(), []);

        assert_eq!(config.address(), "127.0.0.1:0");
        assert_eq!(config.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
        assert!(config.tls().is_none());
        assert!(config.read_timeout().is_none());
        assert!(config.read_header_timeout().is_none());
        assert!(config.write_timeout().is_none());
        assert!(config.idle_timeout().is_none());
        assert!(config.max_header_bytes().is_none());
        assert!(config.negotiation_table().is_empty());
        assert!(config.conn_state().is_none());
        assert!(config.error_log().is_none());
        assert!(config.base_context().is_none());
        assert!(config.conn_context().is_none());
    }

    #[test]
    fn last_shutdown_timeout_wins() {
        let config = ServerConfig::new(
            "127.0.0.1:0",
            Router::new(),
            [
                ServerOption::ShutdownTimeout(Duration::from_secs(5)),
                ServerOption::ShutdownTimeout(Duration::from_millis(200)),
            ],
        );

        assert_eq!(config.shutdown_timeout(), Duration::from_millis(200));
    }

    #[test]
    fn zero_shutdown_timeout_normalized() {
        let config = ServerConfig::builder("127.0.0.1:0", Router::new())
            .shutdown_timeout(Duration::from_secs(3))
            .shutdown_timeout(Duration::ZERO)
            .build();

        assert_eq!(config.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
    }

    #[test]
    fn adjustments_touch_only_their_field() {
        let config = ServerConfig::new(
            "localhost:8080",
            Router::new(),
            [
                ServerOption::ReadTimeout(Duration::from_secs(10)),
                ServerOption::WriteTimeout(Duration::from_secs(20)),
                ServerOption::ReadTimeout(Duration::from_secs(15)),
                ServerOption::MaxHeaderBytes(16 * 1024),
                ServerOption::ErrorLog(Arc::new(TracingLog)),
            ],
        );

        assert_eq!(config.read_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.write_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.read_header_timeout(), None);
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.max_header_bytes(), Some(16 * 1024));
        assert!(config.error_log().is_some());
        assert_eq!(config.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
    }

    #[test]
    fn zero_clears_limits() {
        let config = ServerConfig::builder("127.0.0.1:0", Router::new())
            .idle_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::ZERO)
            .max_header_bytes(8192)
            .max_header_bytes(0)
            .build();

        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.max_header_bytes(), None);
    }

    #[test]
    fn empty_address_is_accepted() {
        let config = ServerConfig::new("", Router::new(), []);
        assert_eq!(config.address(), "");
    }

    #[test]
    fn fluent_and_option_forms_agree() {
        let options = vec![
            ServerOption::ReadHeaderTimeout(Duration::from_secs(2)),
            ServerOption::IdleTimeout(Duration::from_secs(60)),
            ServerOption::ShutdownTimeout(Duration::from_millis(750)),
        ];
        let from_options = ServerConfig::new("127.0.0.1:0", Router::new(), options);
        let fluent = ServerConfig::builder("127.0.0.1:0", Router::new())
            .read_header_timeout(Duration::from_secs(2))
            .idle_timeout(Duration::from_secs(60))
            .shutdown_timeout(Duration::from_millis(750))
            .build();

        assert_eq!(format!("{from_options:?}"), format!("{fluent:?}"));
    }
}
