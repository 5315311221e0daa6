//! Suspension points of a lifecycle operation.
//!
//! Load and reload stop once, at the point where the module has to be
//! imported. [`ModuleManager::start`](crate::ModuleManager::start) returns a
//! [`PendingImport`] there; the caller runs its blocking [`ImportTask`]
//! wherever it likes and passes the result back with the [`Resumption`].

use std::fmt;
use std::sync::Arc;

use crate::error::ImportError;
use crate::namespace::{Module, Namespace};

/// Lifecycle operation requested of a [`ModuleManager`](crate::ModuleManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Import a module and run its loaders.
    Load,
    /// Run a loaded module's unloaders and forget it.
    Unload,
    /// Swap a loaded module for a freshly imported version.
    Reload,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Reload => "reload",
        };
        formatter.write_str(label)
    }
}

/// Blocking import handed off to a worker.
pub type ImportTask = Box<dyn FnOnce() -> Result<Namespace, ImportError> + Send + 'static>;

/// Outcome of starting an operation.
#[derive(Debug)]
#[must_use = "a pending import must be run and resumed to finish the operation"]
pub enum Step<I> {
    /// The operation finished without importing anything.
    Complete,
    /// The operation is waiting for an import.
    Import(PendingImport<I>),
}

/// An import the operation is waiting on, plus the state to resume with.
///
/// Dropping it abandons the operation. The module table is untouched, but a
/// reload abandoned here has already run the previous module's unloaders.
#[must_use = "dropping a pending import abandons the operation"]
pub struct PendingImport<I> {
    task: ImportTask,
    resumption: Resumption<I>,
}

impl<I> PendingImport<I> {
    pub(crate) fn new(task: ImportTask, resumption: Resumption<I>) -> Self {
        Self { task, resumption }
    }

    /// Returns the identity being imported.
    #[must_use]
    pub const fn identity(&self) -> &I {
        &self.resumption.identity
    }

    /// Splits into the blocking task and the state needed to resume.
    pub fn into_parts(self) -> (ImportTask, Resumption<I>) {
        (self.task, self.resumption)
    }

    /// Runs the task on the current thread.
    pub fn run(self) -> (Result<Namespace, ImportError>, Resumption<I>) {
        let result = (self.task)();
        (result, self.resumption)
    }
}

impl<I: fmt::Debug> fmt::Debug for PendingImport<I> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PendingImport")
            .field("resumption", &self.resumption)
            .finish_non_exhaustive()
    }
}

/// State carried across the import of a load or reload.
#[derive(Debug)]
#[must_use = "a resumption must be passed back to the manager"]
pub struct Resumption<I> {
    pub(crate) identity: I,
    pub(crate) state: Resume,
}

impl<I> Resumption<I> {
    /// Returns the identity being operated on.
    #[must_use]
    pub const fn identity(&self) -> &I {
        &self.identity
    }

    /// Returns the operation that will be finished.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self.state {
            Resume::Load => Operation::Load,
            Resume::Reload { .. } => Operation::Reload,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Resume {
    Load,
    Reload {
        old: Namespace,
        old_body: Arc<Module>,
    },
}
