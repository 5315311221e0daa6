//! Module identities and the table recording loaded modules.
//!
//! Path identities and logical names live in separate types, and each
//! identity space gets its own [`ModuleTable`], so a path can never be
//! mistaken for a name or the other way round.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::fs;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::ModuleError;
use crate::namespace::Namespace;

/// Absolute filesystem path identifying a module source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath(PathBuf);

impl ModulePath {
    /// Resolves `path` to the canonical absolute path of the module file.
    ///
    /// Symbolic links, `.` and `..` are resolved through the filesystem when
    /// the file exists. A path to a missing file is made absolute and its
    /// `.` and `..` components are folded lexically, so the import can still
    /// report the file as not found.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::InvalidPath`] when the path is empty or the
    /// current directory cannot be determined.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let requested = path.as_ref();
        let absolute =
            std::path::absolute(requested).map_err(|source| ModuleError::InvalidPath {
                path: requested.to_path_buf(),
                source: Arc::new(source),
            })?;
        let resolved = fs::canonicalize(&absolute).unwrap_or_else(|_| fold_components(&absolute));
        Ok(Self(resolved))
    }

    /// Returns the absolute path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ModulePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0.display())
    }
}

/// Drops `.` and applies `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
fn fold_components(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if folded.parent().is_some() {
                    folded.pop();
                }
            }
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}

/// Logical dotted module name, for example `ext.greeter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

impl ModuleName {
    /// Wraps a logical name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Records which identities are loaded and the namespace each one holds.
#[derive(Debug, Clone)]
pub struct ModuleTable<K> {
    records: HashMap<K, Namespace>,
}

impl<K> Default for ModuleTable<K> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> ModuleTable<K> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the namespace recorded for `identity`.
    #[must_use]
    pub fn get(&self, identity: &K) -> Option<&Namespace> {
        self.records.get(identity)
    }

    /// Returns `true` when `identity` is recorded.
    #[must_use]
    pub fn contains(&self, identity: &K) -> bool {
        self.records.contains_key(identity)
    }

    /// Records `namespace` under `identity`, returning any previous record.
    pub fn insert(&mut self, identity: K, namespace: Namespace) -> Option<Namespace> {
        self.records.insert(identity, namespace)
    }

    /// Forgets `identity`, returning its namespace.
    pub fn remove(&mut self, identity: &K) -> Option<Namespace> {
        self.records.remove(identity)
    }

    /// Returns the number of recorded modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, K, Namespace> {
        self.records.iter()
    }
}
