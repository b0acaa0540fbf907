//! Logging initialization and span helpers.

use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for CI and automation).
    Json,
    /// Compact human-readable logs.
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Safe to call multiple times; subsequent calls are no-ops. Logs go to
/// stderr so command output on stdout stays machine-readable.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `medallion_core=debug`).
///   Falls back to `default_filter` when unset or invalid.
///
/// # Example
///
/// ```rust
/// use medallion_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty, "warn");
/// ```
pub fn init_logging(format: LogFormat, default_filter: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                    .init();
            }
        }
    });
}

/// Creates a span for a provisioning operation.
///
/// # Example
///
/// ```rust
/// use medallion_core::observability::provision_span;
///
/// let span = provision_span("apply", "fmcg");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn provision_span(operation: &str, catalog: &str) -> Span {
    tracing::info_span!("provision", op = operation, catalog = catalog)
}
