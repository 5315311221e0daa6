//! Diagnostic logging for the `hotswap` binary.
//!
//! Module operations emit `tracing` events; this module routes them to
//! stderr so stdout carries only phase reports.

use std::io::{self, IsTerminal};

use hotswap_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Boxed subscriber ready to become the global default.
pub type BoxSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` expression.
    #[error("invalid log filter `{expression}`: {message}")]
    Filter {
        /// The rejected expression.
        expression: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Some other global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Builds the stderr subscriber described by `config` without installing it.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `config.log_filter` does not parse.
pub fn subscriber(config: &Config) -> Result<BoxSubscriber, TelemetryError> {
    let expression = config.log_filter();
    let filter = EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        expression: expression.to_owned(),
        message: error.to_string(),
    })?;
    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    })
}

/// Installs the subscriber for `config` as the process-wide default.
///
/// Only the first successful call has an effect; later calls return `Ok`
/// whatever configuration they carry.
///
/// ```
/// use hotswap_config::{Config, LogFormat};
///
/// let config = Config {
///     log_format: LogFormat::Json,
///     ..Config::default()
/// };
/// hotswap_cli::telemetry::initialise(&config).expect("telemetry installs");
/// tracing::info!(module = "ext.greeter", "logged as one JSON object on stderr");
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another global
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let installed = subscriber(config)?;
            tracing::subscriber::set_global_default(installed).map_err(TelemetryError::Subscriber)
        })
        .map(|_| ())
}
