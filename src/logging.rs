//! Logging setup for the CLI and embedding applications.
//!
//! The builder only emits `tracing` events; installing a subscriber is left
//! to the application. [`init_logging`] installs a console subscriber driven by
//! [`LoggingSettings`], with `RUST_LOG` taking precedence over the configured
//! filter.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LoggingSettings, SettingsError};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
///
/// An already installed global subscriber (for example one set up by a host
/// application) is kept.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SettingsError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => directives,
        _ => settings.resolved_filter()?,
    };

    LOGGER_INITIALIZED.get_or_init(|| {
        let layer = if settings.json {
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .json()
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
        tracing::debug!(filter = %filter, json = settings.json, "logging initialized");
    });
    Ok(())
}
