//! Load, unload and reload of modules against a runtime.
//!
//! [`ModuleManager`] owns one identity table and one import strategy. Every
//! operation checks the table before touching anything, so a call that is
//! illegal for the current state fails without side effects.
//!
//! Load and reload are split in two around the module import, which is the
//! only blocking step. [`ModuleManager::start`] runs everything up to the
//! import and returns a [`Step`]; [`ModuleManager::resume`] runs the rest.
//! [`ModuleManager::run`] drives both halves on the calling thread and
//! [`ModuleManager::run_async`] runs the import on tokio's blocking pool.
//!
//! A reload whose new module cannot be imported, has no loaders, or has a
//! failing loader is rolled back: the previous module's body is restored
//! and its loaders are run again, so the runtime ends up with the previous
//! registrations and the table still records the previous namespace.

mod step;


use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::capability::{Capability, CapabilityKind};
use crate::error::{BoxError, CapabilityError, ImportError, ModuleError, ModuleState};
use crate::identity::ModuleTable;
use crate::namespace::{Module, Namespace};
use crate::runtime::Runtime;
use crate::scanner::collect;
use crate::strategy::ImportStrategy;

pub use self::step::{ImportTask, Operation, PendingImport, Resumption, Step};
use self::step::Resume;

/// Lifecycle state machine for one identity space.
#[derive(Debug)]
pub struct ModuleManager<S: ImportStrategy> {
    strategy: Arc<S>,
    table: ModuleTable<S::Identity>,
}

impl<S: ImportStrategy> ModuleManager<S> {
    /// Creates a manager with an empty table.
    #[must_use]
    pub fn new(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
            table: ModuleTable::default(),
        }
    }

    /// Returns the import strategy.
    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Returns the table of loaded modules.
    #[must_use]
    pub const fn table(&self) -> &ModuleTable<S::Identity> {
        &self.table
    }

    /// Returns `true` when `identity` is loaded.
    #[must_use]
    pub fn is_loaded(&self, identity: &S::Identity) -> bool {
        self.table.contains(identity)
    }

    /// Runs `operation` up to its import, if it has one.
    ///
    /// Unload never imports and finishes here. Load returns the pending
    /// import straight away. Reload first runs the loaded module's
    /// unloaders.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::StateConflict`] when the table state does not
    /// allow the operation, [`ModuleError::MissingLoaders`] when the loaded
    /// module has no unloaders (unload, reload), or
    /// [`ModuleError::FailedUnload`] when one of them fails.
    pub fn start(
        &mut self,
        operation: Operation,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<Step<S::Identity>, ModuleError> {
        match operation {
            Operation::Load => self.start_load(identity).map(Step::Import),
            Operation::Unload => self.unload_now(&identity, runtime).map(|()| Step::Complete),
            Operation::Reload => self.start_reload(identity, runtime).map(Step::Import),
        }
    }

    /// Finishes a load or reload with the outcome of its import.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::StateConflict`] without running any loader when
    /// the table changed since [`ModuleManager::start`]: a load whose identity
    /// was recorded meanwhile, or a reload whose identity was unloaded.
    /// Returns [`ModuleError::FailedLoad`] when the import failed or a new
    /// loader failed, and [`ModuleError::MissingLoaders`] when the new module
    /// has no loaders. A failing reload is rolled back before returning.
    pub fn resume(
        &mut self,
        resumption: Resumption<S::Identity>,
        result: Result<Namespace, ImportError>,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        let Resumption { identity, state } = resumption;
        let expected = match state {
            Resume::Load => ModuleState::Unloaded,
            Resume::Reload { .. } => ModuleState::Loaded,
        };
        self.expect_state(&identity, expected)?;
        match state {
            Resume::Load => {
                let namespace = activate(&identity, result, runtime)?;
                self.table.insert(identity.clone(), namespace);
                info!(module = %identity, operation = %Operation::Load, "module loaded");
                Ok(())
            }
            Resume::Reload { old, old_body } => match activate(&identity, result, runtime) {
                Ok(namespace) => {
                    self.table.insert(identity.clone(), namespace);
                    info!(module = %identity, operation = %Operation::Reload, "module reloaded");
                    Ok(())
                }
                Err(failure) => {
                    warn!(
                        module = %identity,
                        operation = %Operation::Reload,
                        error = %failure,
                        "reload failed, restoring previous module"
                    );
                    rollback(&identity, &old, old_body, runtime);
                    Err(failure)
                }
            },
        }
    }

    /// Runs `operation` to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ModuleManager::start`] or
    /// [`ModuleManager::resume`].
    pub fn run(
        &mut self,
        operation: Operation,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        match self.start(operation, identity, runtime)? {
            Step::Complete => Ok(()),
            Step::Import(pending) => {
                let (result, resumption) = pending.run();
                self.resume(resumption, result, runtime)
            }
        }
    }

    /// Runs `operation` to completion, importing on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime. Dropping the future while
    /// the import runs leaves the table untouched.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleManager::run`]. A worker that panics or is cancelled
    /// surfaces as [`ImportError::Worker`] inside
    /// [`ModuleError::FailedLoad`].
    pub async fn run_async(
        &mut self,
        operation: Operation,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        match self.start(operation, identity, runtime)? {
            Step::Complete => Ok(()),
            Step::Import(pending) => {
                let (task, resumption) = pending.into_parts();
                let result = tokio::task::spawn_blocking(task)
                    .await
                    .unwrap_or_else(|join_error| {
                        Err(ImportError::Worker {
                            identity: resumption.identity().to_string(),
                            message: join_error.to_string(),
                        })
                    });
                self.resume(resumption, result, runtime)
            }
        }
    }

    /// Loads `identity`.
    ///
    /// # Errors
    ///
    /// See [`ModuleManager::start`] and [`ModuleManager::resume`].
    pub fn load(
        &mut self,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        self.run(Operation::Load, identity, runtime)
    }

    /// Unloads `identity`.
    ///
    /// # Errors
    ///
    /// See [`ModuleManager::start`].
    pub fn unload(
        &mut self,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        self.run(Operation::Unload, identity, runtime)
    }

    /// Reloads `identity`.
    ///
    /// # Errors
    ///
    /// See [`ModuleManager::start`] and [`ModuleManager::resume`].
    pub fn reload(
        &mut self,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        self.run(Operation::Reload, identity, runtime)
    }

    fn start_load(
        &self,
        identity: S::Identity,
    ) -> Result<PendingImport<S::Identity>, ModuleError> {
        if self.table.contains(&identity) {
            return Err(ModuleError::StateConflict {
                identity: identity.to_string(),
                state: ModuleState::Loaded,
            });
        }
        let strategy = Arc::clone(&self.strategy);
        let target = identity.clone();
        let task: ImportTask = Box::new(move || strategy.materialize(&target));
        debug!(module = %identity, operation = %Operation::Load, "import scheduled");
        Ok(PendingImport::new(
            task,
            Resumption {
                identity,
                state: Resume::Load,
            },
        ))
    }

    fn unload_now(
        &mut self,
        identity: &S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError> {
        let namespace = self.recorded(identity)?;
        deactivate(identity, &namespace, runtime)?;
        self.table.remove(identity);
        info!(module = %identity, operation = %Operation::Unload, "module unloaded");
        Ok(())
    }

    fn start_reload(
        &self,
        identity: S::Identity,
        runtime: &mut dyn Runtime,
    ) -> Result<PendingImport<S::Identity>, ModuleError> {
        let old = self.recorded(&identity)?;
        let old_body = old.module();
        deactivate(&identity, &old, runtime)?;

        let strategy = Arc::clone(&self.strategy);
        let target = identity.clone();
        let previous = old.clone();
        let task: ImportTask = Box::new(move || strategy.reimport(&target, &previous));
        debug!(module = %identity, operation = %Operation::Reload, "import scheduled");
        Ok(PendingImport::new(
            task,
            Resumption {
                identity,
                state: Resume::Reload { old, old_body },
            },
        ))
    }

    /// Fails unless the table agrees with the state `start` observed, which
    /// another operation on the same identity may have changed since.
    fn expect_state(
        &self,
        identity: &S::Identity,
        expected: ModuleState,
    ) -> Result<(), ModuleError> {
        let state = if self.table.contains(identity) {
            ModuleState::Loaded
        } else {
            ModuleState::Unloaded
        };
        if state == expected {
            return Ok(());
        }
        Err(ModuleError::StateConflict {
            identity: identity.to_string(),
            state,
        })
    }

    fn recorded(&self, identity: &S::Identity) -> Result<Namespace, ModuleError> {
        self.table
            .get(identity)
            .cloned()
            .ok_or_else(|| ModuleError::StateConflict {
                identity: identity.to_string(),
                state: ModuleState::Unloaded,
            })
    }
}

/// Collects the descriptors of `namespace` exposing `wanted`, failing when
/// there are none.
fn capabilities<I: std::fmt::Display>(
    identity: &I,
    namespace: &Namespace,
    wanted: CapabilityKind,
) -> Result<Vec<Arc<Capability>>, ModuleError> {
    let found: Vec<Arc<Capability>> = collect(namespace, wanted).collect();
    if found.is_empty() {
        return Err(ModuleError::MissingLoaders {
            identity: identity.to_string(),
            wanted,
        });
    }
    debug!(module = %identity, capability = %wanted, count = found.len(), "capabilities collected");
    Ok(found)
}

/// Runs the loaders of a freshly imported namespace.
fn activate<I: std::fmt::Display>(
    identity: &I,
    result: Result<Namespace, ImportError>,
    runtime: &mut dyn Runtime,
) -> Result<Namespace, ModuleError> {
    let namespace = result.map_err(|import_error| ModuleError::FailedLoad {
        identity: identity.to_string(),
        source: Box::new(import_error),
    })?;
    for loader in capabilities(identity, &namespace, CapabilityKind::Load)? {
        loader
            .load(runtime)
            .map_err(|failure| ModuleError::FailedLoad {
                identity: identity.to_string(),
                source: cause(failure),
            })?;
    }
    Ok(namespace)
}

/// Runs the unloaders of a recorded namespace.
fn deactivate<I: std::fmt::Display>(
    identity: &I,
    namespace: &Namespace,
    runtime: &mut dyn Runtime,
) -> Result<(), ModuleError> {
    for unloader in capabilities(identity, namespace, CapabilityKind::Unload)? {
        unloader
            .unload(runtime)
            .map_err(|failure| ModuleError::FailedUnload {
                identity: identity.to_string(),
                source: cause(failure),
            })?;
    }
    Ok(())
}

/// Puts the previous module back after a failed reload.
fn rollback<I: std::fmt::Display>(
    identity: &I,
    old: &Namespace,
    old_body: Arc<Module>,
    runtime: &mut dyn Runtime,
) {
    if !Arc::ptr_eq(&old.module(), &old_body) {
        old.restore(old_body);
        debug!(module = %identity, "previous module body restored");
    }
    let loaders: Vec<Arc<Capability>> = collect(old, CapabilityKind::Load).collect();
    for loader in loaders {
        if let Err(failure) = loader.load(runtime) {
            error!(module = %identity, error = %failure, "rollback loader failed");
        }
    }
}

/// Unwraps callback failures so callers see the error the callback raised.
fn cause(failure: CapabilityError) -> BoxError {
    match failure {
        CapabilityError::Callback(inner) => inner,
        other => Box::new(other),
    }
}
