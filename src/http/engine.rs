//! Start/stop contract between the lifecycle coordinator and a serving engine.

use std::future::Future;

use crate::error::EngineError;

/// A request-serving engine driven by [`Server`](crate::lifecycle::Server).
///
/// The coordinator is the only caller. `serve` runs on the caller's task while
/// `set_keep_alives_enabled` and `shutdown` are invoked from the shutdown
/// watcher, possibly before `serve` has bound its listener.
pub trait Engine: Send + Sync + 'static {
    /// Bind and serve until stopped.
    ///
    /// Returns `Err(EngineError::Closed)` once `shutdown` has been requested
    /// (immediately, if it was requested before serving began) and
    /// `Err(EngineError::Bind(_))` when the address cannot be bound.
    fn serve(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Stop accepting and wait for in-flight work to finish.
    ///
    /// Unbounded; the coordinator applies the shutdown timeout.
    fn shutdown(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Allow or refuse reuse of persistent connections.
    ///
    /// For [`HttpEngine`](crate::http::HttpEngine) this only governs HTTP/1
    /// connections accepted after the call. Connections already open, and all
    /// HTTP/2 connections, are wound down by `shutdown` instead.
    fn set_keep_alives_enabled(&self, enabled: bool);
}
