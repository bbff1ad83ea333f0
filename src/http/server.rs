//! Hyper-based serving engine.
//!
//! # Responsibilities
//! - Bind the configured address and run the accept loop
//! - Serve HTTP/1.1 and HTTP/2 (with upgrades) on each connection, optionally over TLS
//! - Hand negotiated ALPN protocols to their registered handlers
//! - Apply header, body, response and idle timeouts
//! - Stop accepting and drain connections on shutdown

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, Request};
use axum::Router;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tower::ServiceExt;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::EngineError;
use crate::http::context;
use crate::http::engine::Engine;
use crate::net::connection::{ConnectionGuard, RequestActivity};
use crate::net::{tls, ConnectionInfo, ConnectionState, ConnectionTracker, Listener};
use crate::observability::Diagnostics;

/// Smallest HTTP/1 read buffer hyper accepts.
const MIN_HEADER_BUF: usize = 8192;

/// How long shutdown waits for a connection that has not started a request,
/// when no header timeout is configured.
const NEW_CONNECTION_GRACE: Duration = Duration::from_secs(5);

/// HTTP engine serving a [`ServerConfig`].
pub struct HttpEngine {
    shared: Arc<Shared>,
}

/// State shared between the accept loop, connection tasks and shutdown.
struct Shared {
    config: Arc<ServerConfig>,
    router: Router,
    diagnostics: Diagnostics,
    keep_alive: AtomicBool,
    /// Flipped to `true` once shutdown is requested.
    closing: watch::Sender<bool>,
    listening: watch::Sender<Option<SocketAddr>>,
    tracker: ConnectionTracker,
}

impl HttpEngine {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let router = build_router(&config);
        let (closing, _) = watch::channel(false);
        let (listening, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                diagnostics: config.diagnostics(),
                router,
                config,
                keep_alive: AtomicBool::new(true),
                closing,
                listening,
                tracker: ConnectionTracker::new(),
            }),
        }
    }

    /// Receives the bound address once the listener is up.
    pub fn listening(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.shared.listening.subscribe()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.shared.listening.borrow()
    }

    pub fn active_connections(&self) -> usize {
        self.shared.tracker.active_count()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }
}

impl Engine for HttpEngine {
    async fn serve(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        let mut closing = shared.closing.subscribe();
        if *closing.borrow_and_update() {
            return Err(EngineError::Closed);
        }

        let mut listener = Listener::bind(shared.config.address(), shared.diagnostics.clone()).await?;
        let local = listener.local_addr()?;
        shared.listening.send_replace(Some(local));
        let base = context::base_context(shared.config.base_context(), local);

        tracing::info!(
            address = %local,
            tls = shared.config.tls().is_some(),
            "HTTP server listening"
        );

        loop {
            tokio::select! {
                biased;
                _ = closing.changed() => {
                    tracing::info!(address = %local, "HTTP server stopped accepting");
                    return Err(EngineError::Closed);
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    Arc::clone(shared).spawn_connection(stream, peer, local, &base);
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        shared.closing.send_replace(true);

        tracing::info!(
            active_connections = shared.tracker.active_count(),
            "Draining connections"
        );
        shared.tracker.wait_for_drain().await;
        tracing::info!("All connections drained");
        Ok(())
    }

    fn set_keep_alives_enabled(&self, enabled: bool) {
        self.shared.keep_alive.store(enabled, Ordering::Release);
    }
}

impl Shared {
    fn spawn_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr, local: SocketAddr, base: &Extensions) {
        let guard = self.tracker.track();
        let info = ConnectionInfo {
            id: guard.id(),
            peer,
            local,
        };
        let extensions = context::connection_context(self.config.conn_context(), base.clone(), &info);
        let activity = Arc::new(RequestActivity::new(info, self.config.conn_state().cloned()));
        activity.observe(ConnectionState::New);

        tokio::spawn(async move {
            self.drive(stream, info, extensions, activity, guard).await;
        });
    }

    async fn drive(
        &self,
        stream: TcpStream,
        info: ConnectionInfo,
        extensions: Extensions,
        activity: Arc<RequestActivity>,
        guard: ConnectionGuard,
    ) {
        match self.config.tls() {
            None => self.serve_http(stream, info, extensions, &activity).await,
            Some(tls_config) => {
                let handshake = tls::acceptor(tls_config).accept(stream);
                let accepted = match self.header_timeout() {
                    Some(limit) => tokio::time::timeout(limit, handshake)
                        .await
                        .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "handshake timed out"))),
                    None => handshake.await,
                };

                match accepted {
                    Ok(stream) => {
                        let handler = tls::negotiated_protocol(&stream)
                            .and_then(|proto| self.config.negotiation_table().get(&proto).cloned());

                        if let Some(handler) = handler {
                            activity.observe(ConnectionState::Hijacked);
                            // Hijacked connections are not waited on during shutdown.
                            drop(guard);
                            handler(stream, info, self.router.clone()).await;
                            return;
                        }

                        self.serve_http(stream, info, extensions, &activity).await;
                    }
                    Err(e) => {
                        self.diagnostics
                            .report(format_args!("http: TLS handshake error from {}: {e}", info.peer));
                    }
                }
            }
        }

        activity.observe(ConnectionState::Closed);
        drop(guard);
    }

    async fn serve_http<I>(&self, io: I, info: ConnectionInfo, extensions: Extensions, activity: &Arc<RequestActivity>)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let service = {
            let router = self.router.clone();
            let activity = Arc::clone(activity);
            service_fn(move |mut request: Request<Incoming>| {
                request.extensions_mut().extend(extensions.clone());
                request.extensions_mut().insert(ConnectInfo(info.peer));
                let guard = activity.begin();
                let router = router.clone();
                async move {
                    let response = router.oneshot(request).await;
                    drop(guard);
                    response
                }
            })
        };

        let builder = self.connection_builder();
        let connection = builder.serve_connection_with_upgrades(TokioIo::new(io), service);
        tokio::pin!(connection);

        let mut closing = self.closing.subscribe();
        let new_grace = self.header_timeout().unwrap_or(NEW_CONNECTION_GRACE);
        // A connection still in `New` is closed only once its first request has begun
        // or the grace period ran out.
        let shutdown_point = async move {
            let _ = closing.wait_for(|closing| *closing).await;
            let _ = tokio::time::timeout(new_grace, activity.first_request()).await;
        };
        tokio::pin!(shutdown_point);

        let mut draining = false;
        let idle_timeout = self.config.idle_timeout().or(self.config.read_timeout());

        let result = loop {
            tokio::select! {
                result = connection.as_mut() => break result,
                _ = shutdown_point.as_mut(), if !draining => {
                    draining = true;
                    connection.as_mut().graceful_shutdown();
                }
                _ = idle(activity, idle_timeout), if !draining => {
                    tracing::debug!(connection_id = %info.id, "Closing idle connection");
                    draining = true;
                    connection.as_mut().graceful_shutdown();
                }
            }
        };

        if let Err(e) = result {
            tracing::debug!(
                connection_id = %info.id,
                peer_addr = %info.peer,
                error = %e,
                "Connection ended with error"
            );
        }
    }

    fn connection_builder(&self) -> auto::Builder<TokioExecutor> {
        let mut builder = auto::Builder::new(TokioExecutor::new());
        let mut http1 = builder.http1();
        http1.keep_alive(self.keep_alive.load(Ordering::Acquire));
        if let Some(limit) = self.header_timeout() {
            http1.timer(TokioTimer::new()).header_read_timeout(limit);
        }
        if let Some(max) = self.config.max_header_bytes() {
            http1.max_buf_size(max.max(MIN_HEADER_BUF));
            builder
                .http2()
                .max_header_list_size(u32::try_from(max).unwrap_or(u32::MAX));
        }
        builder
    }

    /// Bound for the TLS handshake and request headers.
    fn header_timeout(&self) -> Option<Duration> {
        self.config.read_header_timeout().or(self.config.read_timeout())
    }
}

async fn idle(activity: &RequestActivity, timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => activity.idle_for(timeout).await,
        None => std::future::pending().await,
    }
}

/// Wrap the configured handler with the request-level timeouts.
#[allow(deprecated)]
fn build_router(config: &ServerConfig) -> Router {
    let mut router = config.handler().clone();
    if let Some(limit) = config.write_timeout() {
        router = router.layer(TimeoutLayer::new(limit));
    }
    if let Some(limit) = config.read_timeout() {
        router = router.layer(RequestBodyTimeoutLayer::new(limit));
    }
    router.layer(TraceLayer::new_for_http())
}
