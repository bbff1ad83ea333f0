//! Shutdown watcher.
//!
//! Runs beside the serve loop, waits for the cancellation token, then stops
//! the engine within a fresh shutdown window and fires a one-shot completion
//! signal. The window starts when shutdown begins and does not inherit any
//! deadline from the token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::ShutdownError;
use crate::http::Engine;
use crate::observability::{metrics, Diagnostics};

pub(crate) struct ShutdownWatcher<E> {
    engine: Arc<E>,
    timeout: Duration,
    diagnostics: Diagnostics,
}

impl<E: Engine> ShutdownWatcher<E> {
    pub(crate) fn new(engine: Arc<E>, config: &ServerConfig) -> Self {
        Self {
            engine,
            timeout: config.shutdown_timeout(),
            diagnostics: config.diagnostics(),
        }
    }

    /// Spawn the watcher task.
    ///
    /// The returned receiver resolves exactly once, after the watcher is done:
    /// either the bounded stop finished (or timed out) following `token`, or
    /// `abandon` fired first and no stop was needed. `token` is preferred when
    /// both are cancelled.
    pub(crate) fn spawn(self, token: CancellationToken, abandon: CancellationToken) -> oneshot::Receiver<()> {
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    if let Err(e) = self.shutdown().await {
                        tracing::warn!(error = %e, "Graceful shutdown incomplete");
                        self.diagnostics
                            .report(format_args!("failed to gracefully shutdown the server: {e}"));
                    }
                }
                _ = abandon.cancelled() => {
                    tracing::debug!("Serve loop ended before cancellation, watcher exiting");
                }
            }
            let _ = done_tx.send(());
        });

        done_rx
    }

    /// Disable keep-alives and stop the engine, bounded by the shutdown timeout.
    async fn shutdown(&self) -> Result<(), ShutdownError> {
        tracing::info!(timeout = ?self.timeout, "Shutdown requested");
        let started = Instant::now();

        self.engine.set_keep_alives_enabled(false);
        let outcome = match tokio::time::timeout(self.timeout, self.engine.shutdown()).await {
            Ok(result) => result.map_err(ShutdownError::from),
            Err(_) => Err(ShutdownError::Timeout(self.timeout)),
        };

        let label = match &outcome {
            Ok(()) => "ok",
            Err(ShutdownError::Timeout(_)) => "timeout",
            Err(ShutdownError::Engine(_)) => "error",
        };
        metrics::record_shutdown(label, started);
        tracing::info!(outcome = label, elapsed = ?started.elapsed(), "Shutdown finished");

        outcome
    }
}
