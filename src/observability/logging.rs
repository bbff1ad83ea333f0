//! Structured logging and the diagnostic log sink.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Define the diagnostic sink that servers report operational failures to
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The diagnostic sink is optional; reporting with no sink only emits a trace event

use std::fmt;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Destination for server diagnostics such as failed shutdowns and accept errors.
pub trait DiagnosticLog: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> DiagnosticLog for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards diagnostics to `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DiagnosticLog for TracingLog {
    fn log(&self, message: &str) {
        tracing::error!(target: "graceful_http::diagnostic", "{message}");
    }
}

/// Handle to the optional configured sink.
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<Arc<dyn DiagnosticLog>>,
}

impl Diagnostics {
    pub fn new(sink: Option<Arc<dyn DiagnosticLog>>) -> Self {
        Self { sink }
    }

    /// Report a message to the sink. A no-op without one.
    pub fn report(&self, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::debug!(message = %message, has_sink = self.sink.is_some(), "Diagnostic");
        if let Some(sink) = &self.sink {
            sink.log(&message);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn report_without_sink_is_noop() {
        Diagnostics::default().report("nobody listens");
    }

    #[test]
    fn report_reaches_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&seen);
        let sink: Arc<dyn DiagnosticLog> = Arc::new(move |msg: &str| {
            captured.lock().unwrap().push(msg.to_string());
        });
        let diagnostics = Diagnostics::new(Some(sink));

        diagnostics.report(format_args!("failed after {} attempts", 3));

        assert_eq!(*seen.lock().unwrap(), vec!["failed after 3 attempts".to_string()]);
    }
}
