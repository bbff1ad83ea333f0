//! Lifecycle coordinator.
//!
//! # States (per run)
//! ```text
//! Idle ──run()──▶ Serving ──token cancelled──▶ ShuttingDown ──▶ Stopped
//!                    │  │                             ▲              ▲
//!                    │  └──── serve failed (other) ───┘              │
//!                    └──────── startup failed ───────────────────────┘
//! ```
//! `run` consumes the server, so a stopped server cannot be restarted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::{classify, EngineError, ServerError};
use crate::http::{Engine, HttpEngine};
use crate::lifecycle::shutdown::ShutdownWatcher;

/// Runs an [`Engine`] until a cancellation token fires, then shuts it down
/// within the configured shutdown timeout.
pub struct Server<E = HttpEngine> {
    config: Arc<ServerConfig>,
    engine: Arc<E>,
}

impl Server<HttpEngine> {
    /// Create a server backed by [`HttpEngine`].
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let engine = Arc::new(HttpEngine::new(Arc::clone(&config)));
        Self { config, engine }
    }
}

impl<E: Engine> Server<E> {
    /// Create a server around a custom engine.
    pub fn with_engine(config: ServerConfig, engine: E) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Serve until `token` is cancelled and the engine has stopped.
    ///
    /// Returns `Ok(())` after a cancellation-driven shutdown, including one
    /// whose drain timed out. Returns an error naming the address when the
    /// engine fails to start or its serve loop fails; in the latter case the
    /// engine is stopped within the shutdown timeout first. Never returns
    /// before the shutdown watcher has finished.
    pub async fn run(self, token: CancellationToken) -> Result<(), ServerError> {
        let address = self.config.address();
        tracing::info!(
            address,
            shutdown_timeout = ?self.config.shutdown_timeout(),
            "Server starting"
        );

        let stop = token.child_token();
        let abandon = CancellationToken::new();
        let done = ShutdownWatcher::new(Arc::clone(&self.engine), &self.config).spawn(stop.clone(), abandon.clone());

        let served = self.engine.serve().await;

        match &served {
            // Connections accepted before the serve loop failed still get a bounded drain.
            Err(e) if !e.is_closed() && !matches!(e, EngineError::Bind(_)) => stop.cancel(),
            // Releases the watcher when the token never fired; a cancelled token still wins.
            _ => abandon.cancel(),
        }
        // A dropped sender means the watcher panicked; it is gone either way.
        let _ = done.await;

        let result = classify(address, served);
        match &result {
            Ok(()) => tracing::info!(address, "Server stopped"),
            Err(e) => tracing::error!(address, error = %e, "Server failed"),
        }
        result
    }
}
