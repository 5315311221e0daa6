//! Host import system for logically named modules.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{BoxError, ImportError};
use crate::identity::ModuleName;
use crate::namespace::{Module, Namespace};
use crate::strategy::ImportStrategy;

/// Code run to produce the body of a named module.
pub type ModuleBody = Arc<dyn Fn() -> Result<Module, BoxError> + Send + Sync>;

#[derive(Default)]
struct CatalogState {
    definitions: HashMap<String, ModuleBody>,
    imported: HashMap<String, Namespace>,
}

/// Registry of named module bodies with a cache of imported namespaces.
///
/// The first import of a name runs its body and caches the namespace. Later
/// imports return the cached namespace, shared with every other importer.
/// [`ModuleCatalog::reload`] re-runs the body and swaps the contents of that
/// same namespace.
///
/// # Example
///
/// ```
/// use hotswap::{Module, ModuleCatalog, Namespace};
///
/// let catalog = ModuleCatalog::new();
/// catalog.define("ext.greeter", || Ok(Module::builder().value("version", 1).build()));
///
/// let first = catalog.import("ext.greeter").expect("defined module imports");
/// let second = catalog.import("ext.greeter").expect("cached module imports");
/// assert!(Namespace::ptr_eq(&first, &second));
/// ```
#[derive(Default)]
pub struct ModuleCatalog {
    state: Mutex<CatalogState>,
}

impl ModuleCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or redefines the body of `name`.
    ///
    /// Redefinition does not touch an already imported namespace; it takes
    /// effect on the next [`ModuleCatalog::reload`].
    pub fn define<F>(&self, name: impl Into<String>, body: F)
    where
        F: Fn() -> Result<Module, BoxError> + Send + Sync + 'static,
    {
        self.lock().definitions.insert(name.into(), Arc::new(body));
    }

    /// Returns `true` when `name` has been imported.
    #[must_use]
    pub fn is_imported(&self, name: &str) -> bool {
        self.lock().imported.contains_key(name)
    }

    /// Returns the shared namespace for `name`, running its body on first
    /// import.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnitNotFound`] for undefined names and
    /// [`ImportError::Evaluate`] when the body fails. A failed first import
    /// caches nothing.
    pub fn import(&self, name: &str) -> Result<Namespace, ImportError> {
        if let Some(namespace) = self.lock().imported.get(name) {
            return Ok(namespace.clone());
        }
        let module = self.run_body(name)?;
        let mut state = self.lock();
        let namespace = state
            .imported
            .entry(name.to_owned())
            .or_insert_with(|| Namespace::new(module));
        debug!(module = name, "imported catalog module");
        Ok(namespace.clone())
    }

    /// Re-runs the body of `name` inside `namespace`.
    ///
    /// On success the contents of `namespace` are replaced and `namespace` is
    /// cached as the module for `name`. On failure `namespace` is untouched.
    ///
    /// # Errors
    ///
    /// Same as [`ModuleCatalog::import`].
    pub fn reload(&self, name: &str, namespace: &Namespace) -> Result<Namespace, ImportError> {
        let module = self.run_body(name)?;
        namespace.replace(module);
        self.lock()
            .imported
            .insert(name.to_owned(), namespace.clone());
        debug!(module = name, "re-executed catalog module in place");
        Ok(namespace.clone())
    }

    fn run_body(&self, name: &str) -> Result<Module, ImportError> {
        let body = self
            .lock()
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::UnitNotFound {
                identity: name.to_owned(),
            })?;
        body().map_err(|source| ImportError::Evaluate {
            identity: name.to_owned(),
            source,
        })
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let mut defined: Vec<&String> = state.definitions.keys().collect();
        defined.sort();
        formatter
            .debug_struct("ModuleCatalog")
            .field("defined", &defined)
            .field("imported", &state.imported.len())
            .finish()
    }
}

/// Import strategy resolving [`ModuleName`]s through a shared catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogStrategy {
    catalog: Arc<ModuleCatalog>,
}

impl CatalogStrategy {
    /// Creates a strategy over `catalog`.
    #[must_use]
    pub const fn new(catalog: Arc<ModuleCatalog>) -> Self {
        Self { catalog }
    }

    /// Returns the underlying catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<ModuleCatalog> {
        &self.catalog
    }
}

impl ImportStrategy for CatalogStrategy {
    type Identity = ModuleName;

    fn materialize(&self, identity: &ModuleName) -> Result<Namespace, ImportError> {
        self.catalog.import(identity.as_str())
    }

    fn reimport(
        &self,
        identity: &ModuleName,
        previous: &Namespace,
    ) -> Result<Namespace, ImportError> {
        self.catalog.reload(identity.as_str(), previous)
    }
}
