//! Structured logging bootstrap, initialized once from [`crate::Config`].

use tracing_subscriber::{fmt, EnvFilter};

use crate::provider::LogLevel;

/// Install the global `tracing` subscriber. Honors `RUST_LOG` when set,
/// otherwise filters at `log_level`. Emits newline-delimited JSON so log
/// output composes with the rest of the pipeline's file-based artifacts.
pub fn init(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_tracing_level()));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("global tracing subscriber already set, skipping re-init");
    }
}
