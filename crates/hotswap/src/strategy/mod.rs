//! Import strategies that turn an identity into a module namespace.
//!
//! A strategy owns the blocking part of every load and reload. The lifecycle
//! manager hands [`ImportStrategy::materialize`] or
//! [`ImportStrategy::reimport`] to a worker and waits for the result, so
//! implementations must be shareable across threads.
//!
//! Two strategies ship with the crate:
//!
//! - [`PathStrategy`] reads a source file and evaluates it into a brand-new
//!   namespace on every call.
//! - [`CatalogStrategy`] resolves logical names through a [`ModuleCatalog`],
//!   which caches one shared namespace per name and re-executes it in place
//!   on reload.

pub mod catalog;
pub mod path;


use std::fmt;
use std::hash::Hash;

use crate::error::ImportError;
use crate::namespace::Namespace;

pub use self::catalog::{CatalogStrategy, ModuleBody, ModuleCatalog};
pub use self::path::{PathStrategy, SourceEvaluator};

/// Resolves identities of one identity space to namespaces.
pub trait ImportStrategy: Send + Sync + 'static {
    /// Identity type of this space.
    type Identity: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Imports the module for the first time.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnitNotFound`] when nothing exists for the
    /// identity, or another [`ImportError`] when the module cannot be read
    /// or evaluated.
    fn materialize(&self, identity: &Self::Identity) -> Result<Namespace, ImportError>;

    /// Re-executes the module after its previous version was unloaded.
    ///
    /// The returned namespace may be `previous` itself with new contents.
    ///
    /// # Errors
    ///
    /// Same as [`ImportStrategy::materialize`].
    fn reimport(
        &self,
        identity: &Self::Identity,
        previous: &Namespace,
    ) -> Result<Namespace, ImportError>;
}
