//! Domain errors raised by module lifecycle operations.
//!
//! Errors are split by layer. [`CapabilityError`] is what a single loader or
//! unloader reports, [`ImportError`] is what an import strategy reports, and
//! [`ModuleError`] is what the lifecycle state machine surfaces to callers,
//! wrapping the lower layers as its `source`. I/O errors are wrapped in `Arc`
//! to keep the enums small.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::capability::CapabilityKind;

/// Type-erased error produced by capability callbacks and module bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when a capability descriptor is invoked.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The descriptor only accepts the standard [`Client`](crate::Client)
    /// runtime but was handed another implementation.
    #[error("capability requires the standard client runtime, got `{runtime}`")]
    InvalidRuntimeKind {
        /// Type name of the runtime that was supplied.
        runtime: &'static str,
    },

    /// The wrapped callback failed; its error is passed through untouched.
    #[error(transparent)]
    Callback(BoxError),
}

/// Errors raised while materialising a module namespace.
#[derive(Debug, Error)]
pub enum ImportError {
    /// No source or catalog entry exists for the identity.
    #[error("module `{identity}` could not be found")]
    UnitNotFound {
        /// Identity that was looked up.
        identity: String,
    },

    /// The module source exists but could not be read.
    #[error("failed to read module source {}: {source}", path.display())]
    Read {
        /// Path of the module source.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The module body failed while being evaluated.
    #[error("failed to evaluate module `{identity}`: {source}")]
    Evaluate {
        /// Identity of the module being evaluated.
        identity: String,
        /// Error reported by the evaluator or module body.
        #[source]
        source: BoxError,
    },

    /// The worker running the import did not hand back a result.
    #[error("import worker for module `{identity}` did not complete: {message}")]
    Worker {
        /// Identity of the module being imported.
        identity: String,
        /// Description of the worker failure.
        message: String,
    },
}

/// Whether a module was recorded when an operation found it in conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// The identity has a live record.
    Loaded,
    /// The identity has no record.
    Unloaded,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Loaded => "already loaded",
            Self::Unloaded => "not loaded",
        };
        formatter.write_str(label)
    }
}

/// Errors surfaced by load, unload and reload.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The table state contradicts the operation's precondition.
    #[error("module `{identity}` is {state}")]
    StateConflict {
        /// Identity the operation targeted.
        identity: String,
        /// State the identity was found in.
        state: ModuleState,
    },

    /// The module exposes no descriptor with the wanted capability.
    #[error("module `{identity}` declares no {wanted}s")]
    MissingLoaders {
        /// Identity of the module that was scanned.
        identity: String,
        /// Capability the scan was looking for.
        wanted: CapabilityKind,
    },

    /// Importing the module or running one of its loaders failed.
    #[error("failed to load module `{identity}`: {source}")]
    FailedLoad {
        /// Identity of the module.
        identity: String,
        /// Original failure.
        #[source]
        source: BoxError,
    },

    /// Running one of the module's unloaders failed.
    #[error("failed to unload module `{identity}`: {source}")]
    FailedUnload {
        /// Identity of the module.
        identity: String,
        /// Original failure.
        #[source]
        source: BoxError,
    },

    /// A path identity could not be resolved to an absolute path.
    #[error("cannot resolve module path {}: {source}", path.display())]
    InvalidPath {
        /// Path as supplied by the caller.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ModuleError {
    /// Returns the identity the error refers to, as displayed in messages.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::StateConflict { identity, .. }
            | Self::MissingLoaders { identity, .. }
            | Self::FailedLoad { identity, .. }
            | Self::FailedUnload { identity, .. } => identity.clone(),
            Self::InvalidPath { path, .. } => path.display().to_string(),
        }
    }
}
