//! Layered configuration for the `hotswap` command-line tool.
//!
//! [`Config`] merges built-in defaults, configuration files, `HOTSWAP_*`
//! environment variables and command-line flags through `ortho_config`, in
//! that order of increasing precedence.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use crate::defaults::{
    DEFAULT_BLOCKING_THREADS, DEFAULT_LOG_FILTER, default_blocking_threads, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use crate::logging::{LogFormat, LogFormatParseError};

/// Settings shared by the `hotswap` binary and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HOTSWAP")]
pub struct Config {
    /// `tracing` filter expression, for example `hotswap=debug`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for diagnostic logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Upper bound on threads running module imports concurrently.
    #[serde(default = "default_blocking_threads")]
    pub blocking_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            blocking_threads: default_blocking_threads(),
        }
    }
}

impl Config {
    /// Loads configuration from files and the environment only.
    ///
    /// Command-line arguments belong to the binary, so the loader sees just
    /// the program name.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `ortho_config` error when a layer is malformed.
    pub fn load_without_cli() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter([OsString::from("hotswap")])
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the blocking pool size, never less than one.
    #[must_use]
    pub fn blocking_threads(&self) -> usize {
        self.blocking_threads.max(1)
    }
}
