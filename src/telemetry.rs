//! Logging initialisation.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and an `fmt` layer
//! in JSON (production) or pretty (development) form. `RUST_LOG`, when set,
//! takes precedence over the configured level.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

/// Build the filter for `level`, unless `RUST_LOG` is set.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level `{level}`"))?,
    };
    // Connection-level chatter from the HTTP server is rarely useful.
    Ok(filter.add_directive("may_minihttp=warn".parse()?))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level)?);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
    installed.context("A logging subscriber is already installed")
}
