//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use hotswap::ModuleError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the import runtime: {0}")]
    StartRuntime(io::Error),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error("failed to serialise report: {0}")]
    SerialiseReport(serde_json::Error),
    #[error("failed to write report: {0}")]
    WriteReport(io::Error),
}
