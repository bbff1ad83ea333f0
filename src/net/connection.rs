//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Report connection state transitions to the configured observer
//! - Count live connections so shutdown can wait for the drain
//! - Track in-flight requests per connection (Active/Idle, idle timeout)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Addressing details of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub local: SocketAddr,
}

/// Connection state reported to the connection-state observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Just accepted; no request read yet.
    New,
    /// At least one request is being processed.
    Active,
    /// Keep-alive connection waiting for its next request.
    Idle,
    /// Handed off to a negotiated protocol handler. Terminal; no `Closed` follows.
    Hijacked,
    /// Connection is closed.
    Closed,
}

/// Callback invoked on every connection state transition.
pub type ConnStateFn = Arc<dyn Fn(&ConnectionInfo, ConnectionState) + Send + Sync>;

/// Tracks live connections for graceful shutdown.
///
/// The count lives in a watch channel so shutdown can wait for it to reach zero.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { active: Arc::new(tx) }
    }

    /// Record a new live connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active.send_modify(|count| *count += 1);
        metrics::connection_opened();
        ConnectionGuard {
            active: Arc::clone(&self.active),
            id: ConnectionId::new(),
        }
    }

    /// Get current live connection count.
    pub fn active_count(&self) -> usize {
        *self.active.borrow()
    }

    /// Wait until every tracked connection has been released.
    pub async fn wait_for_drain(&self) {
        let mut rx = self.active.subscribe();
        // The sender lives as long as `self`, so this cannot fail while we wait.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active: Arc<watch::Sender<usize>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.send_modify(|count| *count = count.saturating_sub(1));
        metrics::connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection released");
    }
}

/// In-flight request accounting for a single connection.
pub(crate) struct RequestActivity {
    in_flight: watch::Sender<usize>,
    /// Set once the first request has begun; the connection has left `New`.
    started: watch::Sender<bool>,
    observer: Option<ConnStateFn>,
    info: ConnectionInfo,
}

impl RequestActivity {
    pub(crate) fn new(info: ConnectionInfo, observer: Option<ConnStateFn>) -> Self {
        let (in_flight, _) = watch::channel(0);
        let (started, _) = watch::channel(false);
        Self {
            in_flight,
            started,
            observer,
            info,
        }
    }

    pub(crate) fn observe(&self, state: ConnectionState) {
        tracing::trace!(connection_id = %self.info.id, peer_addr = %self.info.peer, ?state, "Connection state");
        if let Some(observer) = &self.observer {
            observer(&self.info, state);
        }
    }

    /// Mark a request as started. The connection becomes `Active` on the first one.
    pub(crate) fn begin(self: &Arc<Self>) -> RequestGuard {
        let mut became_active = false;
        self.in_flight.send_modify(|count| {
            became_active = *count == 0;
            *count += 1;
        });
        self.started.send_if_modified(|started| !std::mem::replace(started, true));
        if became_active {
            self.observe(ConnectionState::Active);
        }
        RequestGuard {
            activity: Arc::clone(self),
        }
    }

    /// Resolves once a request has begun on this connection, immediately if one already has.
    pub(crate) async fn first_request(&self) {
        let mut rx = self.started.subscribe();
        let _ = rx.wait_for(|started| *started).await;
    }

    /// Resolves once the connection has had no in-flight request for `timeout`.
    pub(crate) async fn idle_for(&self, timeout: Duration) {
        let mut rx = self.in_flight.subscribe();
        loop {
            let idle = rx.wait_for(|count| *count == 0).await.is_ok();
            if !idle {
                return std::future::pending().await;
            }
            tokio::select! {
                _ = tokio::time::sleep(timeout) => return,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return std::future::pending().await;
                    }
                }
            }
        }
    }
}

/// Held while a request is being processed.
pub(crate) struct RequestGuard {
    activity: Arc<RequestActivity>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let mut became_idle = false;
        self.activity.in_flight.send_modify(|count| {
            *count = count.saturating_sub(1);
            became_idle = *count == 0;
        });
        if became_idle {
            self.activity.observe(ConnectionState::Idle);
        }
    }
}
