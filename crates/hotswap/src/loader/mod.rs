//! Batched module operations over both identity spaces.
//!
//! [`ModuleLoader`] owns a [`ModuleManager`] for module files and another for
//! logically named modules, and routes each [`ModuleSpec`] to the right one.
//! Batches run strictly in the order given and stop at the first failure;
//! modules handled before the failure keep their new state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::ModuleError;
use crate::identity::{ModuleName, ModulePath};
use crate::lifecycle::{ModuleManager, Operation};
use crate::runtime::Runtime;
use crate::strategy::{CatalogStrategy, ModuleCatalog, PathStrategy};

/// A module to operate on, either a source file or a logical name.
///
/// Strings convert to logical names and paths convert to files, so the two
/// spaces are never confused.
///
/// ```
/// use std::path::Path;
/// use hotswap::ModuleSpec;
///
/// assert!(matches!(ModuleSpec::from("ext.greeter"), ModuleSpec::Name(_)));
/// assert!(matches!(ModuleSpec::from(Path::new("greeter.toml")), ModuleSpec::Path(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSpec {
    /// A module source file, resolved to an absolute path before use.
    Path(PathBuf),
    /// A logical dotted name resolved through the catalog.
    Name(String),
}

impl From<&str> for ModuleSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ModuleSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&Path> for ModuleSpec {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ModuleSpec {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&PathBuf> for ModuleSpec {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl fmt::Display for ModuleSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(formatter, "{}", path.display()),
            Self::Name(name) => formatter.write_str(name),
        }
    }
}

/// Entry point for loading, unloading and reloading modules.
///
/// # Example
///
/// ```
/// use hotswap::{Client, Module, ModuleLoader, as_loader, as_unloader};
///
/// let mut loader = ModuleLoader::default();
/// loader.catalog().define("ext.greeter", || {
///     Ok(Module::builder()
///         .capability("setup", as_loader(|_| Ok(())))
///         .capability("teardown", as_unloader(|_| Ok(())))
///         .build())
/// });
///
/// let mut client = Client::new();
/// loader.load_many(["ext.greeter"], &mut client).expect("module loads");
/// assert!(loader.is_loaded(&"ext.greeter".into()));
/// loader.unload_many(["ext.greeter"], &mut client).expect("module unloads");
/// assert!(!loader.is_loaded(&"ext.greeter".into()));
/// ```
#[derive(Debug)]
pub struct ModuleLoader {
    paths: ModuleManager<PathStrategy>,
    names: ModuleManager<CatalogStrategy>,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(PathStrategy::default(), Arc::new(ModuleCatalog::new()))
    }
}

impl ModuleLoader {
    /// Creates a loader reading files with `paths` and resolving names
    /// through `catalog`.
    #[must_use]
    pub fn new(paths: PathStrategy, catalog: Arc<ModuleCatalog>) -> Self {
        Self {
            paths: ModuleManager::new(paths),
            names: ModuleManager::new(CatalogStrategy::new(catalog)),
        }
    }

    /// Returns the catalog used for logical names.
    #[must_use]
    pub fn catalog(&self) -> &Arc<ModuleCatalog> {
        self.names.strategy().catalog()
    }

    /// Returns the manager for module files.
    #[must_use]
    pub const fn path_modules(&self) -> &ModuleManager<PathStrategy> {
        &self.paths
    }

    /// Returns the manager for logically named modules.
    #[must_use]
    pub const fn named_modules(&self) -> &ModuleManager<CatalogStrategy> {
        &self.names
    }

    /// Returns `true` when `spec` is loaded.
    ///
    /// A path that cannot be resolved is reported as not loaded.
    #[must_use]
    pub fn is_loaded(&self, spec: &ModuleSpec) -> bool {
        match spec {
            ModuleSpec::Path(path) => ModulePath::resolve(path)
                .is_ok_and(|identity| self.paths.is_loaded(&identity)),
            ModuleSpec::Name(name) => self.names.is_loaded(&ModuleName::new(name.as_str())),
        }
    }

    /// Loads each module in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to load.
    pub fn load_many<I>(&mut self, specs: I, runtime: &mut dyn Runtime) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many(Operation::Load, specs, runtime)
    }

    /// Unloads each module in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to unload.
    pub fn unload_many<I>(
        &mut self,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many(Operation::Unload, specs, runtime)
    }

    /// Reloads each module in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to reload.
    pub fn reload_many<I>(
        &mut self,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many(Operation::Reload, specs, runtime)
    }

    /// Asynchronous counterpart of [`ModuleLoader::load_many`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to load.
    pub async fn load_many_async<I>(
        &mut self,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many_async(Operation::Load, specs, runtime).await
    }

    /// Asynchronous counterpart of [`ModuleLoader::unload_many`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to unload.
    pub async fn unload_many_async<I>(
        &mut self,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many_async(Operation::Unload, specs, runtime).await
    }

    /// Asynchronous counterpart of [`ModuleLoader::reload_many`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first module that fails to reload.
    pub async fn reload_many_async<I>(
        &mut self,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        self.run_many_async(Operation::Reload, specs, runtime).await
    }

    fn run_many<I>(
        &mut self,
        operation: Operation,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        for item in specs {
            let spec: ModuleSpec = item.into();
            debug!(module = %spec, %operation, "dispatching");
            match spec {
                ModuleSpec::Path(path) => {
                    self.paths
                        .run(operation, ModulePath::resolve(path)?, runtime)?;
                }
                ModuleSpec::Name(name) => {
                    self.names.run(operation, ModuleName::new(name), runtime)?;
                }
            }
        }
        Ok(())
    }

    async fn run_many_async<I>(
        &mut self,
        operation: Operation,
        specs: I,
        runtime: &mut dyn Runtime,
    ) -> Result<(), ModuleError>
    where
        I: IntoIterator,
        I::Item: Into<ModuleSpec>,
    {
        for item in specs {
            let spec: ModuleSpec = item.into();
            debug!(module = %spec, %operation, "dispatching");
            match spec {
                ModuleSpec::Path(path) => {
                    self.paths
                        .run_async(operation, ModulePath::resolve(path)?, runtime)
                        .await?;
                }
                ModuleSpec::Name(name) => {
                    self.names
                        .run_async(operation, ModuleName::new(name), runtime)
                        .await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
