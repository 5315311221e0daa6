//! Entry point for the `hotswap` binary.
//!
//! Delegates to [`hotswap_cli::run`], which loads configuration, installs
//! telemetry and drives module operations against a fresh client.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    hotswap_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
