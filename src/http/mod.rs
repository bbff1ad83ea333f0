//! HTTP engine subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle coordinator
//!     → engine.rs (serve / shutdown / keep-alive contract)
//!     → server.rs (HttpEngine: accept loop, per-connection hyper service)
//!     → context.rs (base and per-connection request extensions)
//!     → negotiation.rs (ALPN protocol → upgrade handler)
//!     → configured axum Router
//! ```
//!
//! # Design Decisions
//! - The coordinator only knows the Engine trait; HttpEngine is one implementation
//! - HTTP/1.1 and HTTP/2 are served through hyper-util's auto builder
//! - Serve returns as soon as accepting stops; shutdown waits for the drain

pub mod context;
pub mod engine;
pub mod negotiation;
pub mod server;

pub use context::{BaseContextFn, ConnContextFn};
pub use engine::Engine;
pub use negotiation::{protocol_handler, NegotiationTable, ProtocolHandler};
pub use server::HttpEngine;
