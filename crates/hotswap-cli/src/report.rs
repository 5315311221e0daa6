//! Rendering of per-phase unit reports.

use std::io::Write;

use hotswap::{Operation, Unit};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::errors::AppError;

/// Units registered with the client after one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    phase: String,
    units: Vec<Unit>,
}

impl PhaseReport {
    /// Captures the units present after `operation` completed.
    #[must_use]
    pub fn new(operation: Operation, units: &[Unit]) -> Self {
        Self {
            phase: operation.to_string(),
            units: units.to_vec(),
        }
    }

    /// Returns the phase name.
    #[must_use]
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Returns the registered units in registration order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }
}

pub(crate) fn render<W: Write>(
    reports: &[PhaseReport],
    format: OutputFormat,
    out: &mut W,
) -> Result<(), AppError> {
    for report in reports {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, report).map_err(AppError::SerialiseReport)?;
                writeln!(out).map_err(AppError::WriteReport)?;
            }
            OutputFormat::Human => {
                writeln!(out, "{}", human_line(report)).map_err(AppError::WriteReport)?;
            }
        }
    }
    Ok(())
}

fn human_line(report: &PhaseReport) -> String {
    if report.units.is_empty() {
        return format!("{}: (no units)", report.phase);
    }
    let units: Vec<String> = report.units.iter().map(ToString::to_string).collect();
    format!("{}: {}", report.phase, units.join(", "))
}
