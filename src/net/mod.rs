//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, transient error backoff)
//!     → tls.rs (optional TLS handshake, ALPN lookup)
//!     → connection.rs (lifecycle tracking, state observer)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     New → Active ⇄ Idle → Closed
//!     New → Hijacked (negotiated protocol handler owns the stream)
//! ```
//!
//! # Design Decisions
//! - Each connection tracked for graceful shutdown
//! - TLS is optional and handled transparently

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{ConnStateFn, ConnectionId, ConnectionInfo, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError};
