use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default upper bound on threads running module imports.
pub const DEFAULT_BLOCKING_THREADS: usize = 8;

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value for serde defaults.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default size of the blocking import pool.
#[must_use]
pub const fn default_blocking_threads() -> usize {
    DEFAULT_BLOCKING_THREADS
}
