//! Import of module source files by absolute path.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{BoxError, ImportError};
use crate::identity::ModulePath;
use crate::namespace::{Module, Namespace};
use crate::source::TomlModuleEvaluator;
use crate::strategy::ImportStrategy;

/// Turns the text of a module source into a [`Module`].
pub trait SourceEvaluator: Send + Sync {
    /// Evaluates `source`, read from `path`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while parsing or running the module body.
    fn evaluate(&self, path: &Path, source: &str) -> Result<Module, BoxError>;
}

/// Reads module files and evaluates them into fresh namespaces.
///
/// Every call produces a namespace that nothing else references, so a reload
/// never disturbs the namespace that is still recorded.
#[derive(Clone)]
pub struct PathStrategy {
    evaluator: Arc<dyn SourceEvaluator>,
}

impl PathStrategy {
    /// Creates a strategy evaluating sources with `evaluator`.
    #[must_use]
    pub fn new(evaluator: impl SourceEvaluator + 'static) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
        }
    }

    fn import(&self, identity: &ModulePath) -> Result<Namespace, ImportError> {
        let path = identity.as_path();
        let text = std::fs::read_to_string(path).map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                ImportError::UnitNotFound {
                    identity: identity.to_string(),
                }
            } else {
                ImportError::Read {
                    path: path.to_path_buf(),
                    source: Arc::new(error),
                }
            }
        })?;
        debug!(module = %identity, bytes = text.len(), "evaluating module source");
        let module = self
            .evaluator
            .evaluate(path, &text)
            .map_err(|source| ImportError::Evaluate {
                identity: identity.to_string(),
                source,
            })?;
        Ok(Namespace::new(module))
    }
}

impl Default for PathStrategy {
    fn default() -> Self {
        Self::new(TomlModuleEvaluator)
    }
}

impl fmt::Debug for PathStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PathStrategy")
            .finish_non_exhaustive()
    }
}

impl ImportStrategy for PathStrategy {
    type Identity = ModulePath;

    fn materialize(&self, identity: &ModulePath) -> Result<Namespace, ImportError> {
        self.import(identity)
    }

    fn reimport(
        &self,
        identity: &ModulePath,
        _previous: &Namespace,
    ) -> Result<Namespace, ImportError> {
        self.import(identity)
    }
}
