//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Run (server.rs):
//!     spawn watcher → engine.serve() on caller task → classify outcome
//!     → serve failure: trigger bounded stop; otherwise release watcher
//!     → wait for watcher completion → return
//!
//! Shutdown (shutdown.rs):
//!     token cancelled → disable keep-alive → engine.shutdown() bounded by
//!     shutdown timeout → report failure to diagnostic sink → fire completion
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel token
//! ```
//!
//! # Design Decisions
//! - Shutdown has a timeout: draining is abandoned after the deadline
//! - Shutdown failures are logged, never returned
//! - The run never outlives or leaks its watcher task

pub mod server;
pub(crate) mod shutdown;
pub mod signals;

pub use server::Server;
pub use signals::{cancel_on_signal, shutdown_signal};
