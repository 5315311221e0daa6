//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Rendering of phase reports on stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One line per phase listing the registered units.
    #[default]
    Human,
    /// One JSON object per phase.
    Json,
}

/// Loads, reloads and unloads module files against a standard client.
#[derive(Parser, Debug)]
#[command(name = "hotswap", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Controls how phase reports are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    /// The operation to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations offered by the binary.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Loads module files and reports the registered units.
    Load {
        /// Module source files, loaded in order.
        #[arg(value_name = "MODULE", required = true)]
        modules: Vec<PathBuf>,
    },
    /// Loads, reloads and then unloads module files.
    Cycle {
        /// Module source files, processed in order within each phase.
        #[arg(value_name = "MODULE", required = true)]
        modules: Vec<PathBuf>,
    },
}

impl CliCommand {
    pub(crate) fn modules(&self) -> &[PathBuf] {
        match self {
            Self::Load { modules } | Self::Cycle { modules } => modules,
        }
    }
}
