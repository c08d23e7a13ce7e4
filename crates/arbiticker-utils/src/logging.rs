//! Logging and tracing utilities

use crate::config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the filter: `RUST_LOG` wins, otherwise the configured directive
fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber
///
/// Panics if a global subscriber was already installed; use
/// [`try_init_tracing`] where that can happen (tests, embedding).
pub fn init_tracing(config: &Config) {
    if let Err(err) = try_init_tracing(config) {
        panic!("failed to install tracing subscriber: {err}");
    }
}

/// Initialize the global tracing subscriber, reporting instead of panicking
/// when one is already set
///
/// Events go to stderr so command output on stdout stays clean.
pub fn try_init_tracing(config: &Config) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));
    match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
}
