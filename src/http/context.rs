//! Request context factories.
//!
//! The base context is built once per serve call from the listener address;
//! each connection then derives its own context from it. The resulting
//! extensions are copied into every request served on that connection, where
//! handlers read them with `axum::Extension`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Extensions;

use crate::net::ConnectionInfo;

/// Builds the base context from the listener's local address.
pub type BaseContextFn = Arc<dyn Fn(SocketAddr) -> Extensions + Send + Sync>;

/// Derives a connection's context from the base context.
pub type ConnContextFn = Arc<dyn Fn(Extensions, &ConnectionInfo) -> Extensions + Send + Sync>;

/// Base context for a listener. Empty without a factory.
pub(crate) fn base_context(factory: Option<&BaseContextFn>, local: SocketAddr) -> Extensions {
    factory.map(|f| f(local)).unwrap_or_default()
}

/// Context for one connection. The base context passes through without a factory.
pub(crate) fn connection_context(
    factory: Option<&ConnContextFn>,
    base: Extensions,
    info: &ConnectionInfo,
) -> Extensions {
    match factory {
        Some(f) => f(base, info),
        None => base,
    }
}
