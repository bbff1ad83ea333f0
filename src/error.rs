//! Error taxonomy and serve-outcome classification.
//!
//! ```text
//! engine.serve() outcome
//!     Ok(()) / EngineError::Closed  → deliberate closure → Ok(())
//!     EngineError::Bind             → ServerError::Startup
//!     anything else                 → ServerError::Serve
//!
//! bounded stop outcome
//!     ShutdownError                 → diagnostic sink only, never returned
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::net::ListenerError;

/// Outcomes reported by an [`Engine`](crate::http::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The serve loop ended because stop was requested.
    #[error("server closed")]
    Closed,

    /// The listening address could not be bound.
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// The accept loop hit a non-recoverable error.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this is the deliberate-closure sentinel.
    pub fn is_closed(&self) -> bool {
        matches!(self, EngineError::Closed)
    }
}

impl From<ListenerError> for EngineError {
    fn from(err: ListenerError) -> Self {
        match err {
            ListenerError::Bind(e) => EngineError::Bind(e),
            ListenerError::Accept(e) => EngineError::Accept(e),
        }
    }
}

/// Errors returned by [`Server::run`](crate::lifecycle::Server::run).
#[derive(Debug, Error)]
pub enum ServerError {
    /// The engine could not start listening.
    #[error("could not listen on {address}: {source}")]
    Startup {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The serve loop failed for a reason other than a requested shutdown.
    #[error("could not listen on {address}: {source}")]
    Serve {
        address: String,
        #[source]
        source: EngineError,
    },
}

impl ServerError {
    /// The configured address the failing run was serving.
    pub fn address(&self) -> &str {
        match self {
            ServerError::Startup { address, .. } | ServerError::Serve { address, .. } => address,
        }
    }

    pub fn is_startup(&self) -> bool {
        matches!(self, ServerError::Startup { .. })
    }
}

/// Failures of the bounded stop operation.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Draining did not finish before the shutdown timeout.
    #[error("shutdown did not complete within {0:?}")]
    Timeout(Duration),

    /// The engine reported an error while stopping.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Convert the serve loop outcome into the run result.
pub(crate) fn classify(address: &str, outcome: Result<(), EngineError>) -> Result<(), ServerError> {
    match outcome {
        Ok(()) | Err(EngineError::Closed) => Ok(()),
        Err(EngineError::Bind(source)) => Err(ServerError::Startup {
            address: address.to_string(),
            source,
        }),
        Err(source) => Err(ServerError::Serve {
            address: address.to_string(),
            source,
        }),
    }
}
