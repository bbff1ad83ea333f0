//! TCP listener with accept-error recovery.
//!
//! # Responsibilities
//! - Bind to the configured address (host names are resolved)
//! - Accept incoming TCP connections
//! - Ride out per-connection and resource-exhaustion accept errors

use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::observability::Diagnostics;
use crate::resilience::backoff::calculate_backoff;

/// Initial delay after a resource-exhaustion accept error.
const ACCEPT_BACKOFF_BASE_MS: u64 = 5;
/// Upper bound for the accept backoff.
const ACCEPT_BACKOFF_MAX_MS: u64 = 1_000;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// A TCP listener that retries transient accept failures.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Consecutive resource-exhaustion failures, drives the backoff.
    failures: u32,
    diagnostics: Diagnostics,
}

impl Listener {
    /// Bind to `address`.
    pub async fn bind(address: &str, diagnostics: Diagnostics) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(ListenerError::Bind)?;

        let local_addr = listener
            .local_addr()
            .map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            failures: 0,
            diagnostics,
        })
    }

    /// Accept a new connection.
    ///
    /// Connection-level errors are skipped, resource exhaustion is retried with
    /// backoff, anything else is returned.
    pub async fn accept(&mut self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        loop {
            match self.inner.accept().await {
                Ok((stream, addr)) => {
                    self.failures = 0;
                    tracing::debug!(peer_addr = %addr, "Connection accepted");
                    return Ok((stream, addr));
                }
                Err(e) if is_connection_error(&e) => {
                    tracing::debug!(error = %e, "Connection failed before accept completed");
                }
                Err(e) if is_resource_exhaustion(&e) => {
                    self.failures = self.failures.saturating_add(1);
                    let delay = calculate_backoff(self.failures, ACCEPT_BACKOFF_BASE_MS, ACCEPT_BACKOFF_MAX_MS);
                    tracing::warn!(error = %e, delay = ?delay, "Accept failed, backing off");
                    self.diagnostics
                        .report(format_args!("http: Accept error: {e}; retrying in {delay:?}"));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(ListenerError::Accept(e)),
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }
}

/// Errors that only affect the connection being accepted.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Out of file descriptors (ENFILE/EMFILE) or memory.
fn is_resource_exhaustion(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(23) | Some(24)) || e.kind() == io::ErrorKind::OutOfMemory
}
