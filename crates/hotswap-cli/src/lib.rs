//! Command-line driver for the `hotswap` module lifecycle.
//!
//! [`run`] parses arguments, loads [`Config`] from files and the environment,
//! installs telemetry and executes the requested operation against a fresh
//! [`Client`]. Imports run on a tokio runtime whose blocking pool is capped by
//! [`Config::blocking_threads`].

mod cli;
mod errors;
mod report;
pub mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hotswap::{Client, ModuleLoader, Operation};
use hotswap_config::Config;
use tracing::info;

use crate::cli::{Cli, CliCommand};
pub use crate::cli::OutputFormat;
use crate::errors::AppError;
pub use crate::report::PhaseReport;

/// Runs the CLI with the given arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let mut session = Session::default();
    let outcome = Config::load_without_cli()
        .map_err(AppError::LoadConfiguration)
        .and_then(|config| execute(&cli.command, &config, &mut session));

    let rendered = report::render(session.reports(), cli.output, stdout);
    match outcome.and(rendered) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "hotswap: {error}");
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W, E>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    if error.use_stderr() {
        let _ = write!(stderr, "{error}");
        ExitCode::from(2)
    } else {
        let _ = write!(stdout, "{error}");
        ExitCode::SUCCESS
    }
}

fn execute(command: &CliCommand, config: &Config, session: &mut Session) -> Result<(), AppError> {
    telemetry::initialise(config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .max_blocking_threads(config.blocking_threads())
        .build()
        .map_err(AppError::StartRuntime)?;

    let phases: &[Operation] = match command {
        CliCommand::Load { .. } => &[Operation::Load],
        CliCommand::Cycle { .. } => &[Operation::Load, Operation::Reload, Operation::Unload],
    };
    runtime.block_on(session.run_phases(phases, command.modules()))
}

/// Loader, client and the reports gathered so far.
#[derive(Debug, Default)]
struct Session {
    loader: ModuleLoader,
    client: Client,
    reports: Vec<PhaseReport>,
}

impl Session {
    async fn run_phases(
        &mut self,
        phases: &[Operation],
        modules: &[PathBuf],
    ) -> Result<(), AppError> {
        for &operation in phases {
            let specs = modules.iter().map(PathBuf::as_path);
            match operation {
                Operation::Load => {
                    self.loader.load_many_async(specs, &mut self.client).await?;
                }
                Operation::Unload => {
                    self.loader.unload_many_async(specs, &mut self.client).await?;
                }
                Operation::Reload => {
                    self.loader.reload_many_async(specs, &mut self.client).await?;
                }
            }
            info!(%operation, modules = modules.len(), "phase complete");
            self.reports
                .push(PhaseReport::new(operation, self.client.units()));
        }
        Ok(())
    }

    fn reports(&self) -> &[PhaseReport] {
        &self.reports
    }
}
