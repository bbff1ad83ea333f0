//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → logging.rs (diagnostic sink for operational failures)
//!     → metrics.rs (connection and shutdown counters)
//!
//! Consumers:
//!     → fmt subscriber (stdout)
//!     → configured DiagnosticLog, if any
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{DiagnosticLog, Diagnostics, TracingLog};
