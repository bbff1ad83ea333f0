//! Protocol negotiation table.
//!
//! Maps an ALPN protocol name to a handler that takes over the TLS stream once
//! that protocol has been agreed. Protocols missing from the table are served
//! as HTTP.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;

use crate::net::ConnectionInfo;

/// Upgrade handler for a negotiated protocol. Owns the connection until it returns.
pub type ProtocolHandler =
    Arc<dyn Fn(TlsStream<TcpStream>, ConnectionInfo, Router) -> BoxFuture<'static, ()> + Send + Sync>;

pub type NegotiationTable = HashMap<String, ProtocolHandler>;

/// Wrap an async function as a [`ProtocolHandler`].
pub fn protocol_handler<F, Fut>(handler: F) -> ProtocolHandler
where
    F: Fn(TlsStream<TcpStream>, ConnectionInfo, Router) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(
        move |stream: TlsStream<TcpStream>, info: ConnectionInfo, router: Router| -> BoxFuture<'static, ()> {
            Box::pin(handler(stream, info, router))
        },
    )
}
