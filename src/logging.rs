//! Structured logging setup.
//!
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.as_str())
    };
    let registry = tracing_subscriber::registry().with(filter);

    // log lines go to stderr; stdout carries command output
    let installed = match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Pretty, false) => registry
            .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Compact, true) => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Compact, false) => registry
            .with(fmt::layer().compact().without_time().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, true) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, false) => registry
            .with(fmt::layer().json().without_time().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
}
