//! Materialised module bodies and the shared handle that records them.
//!
//! A [`Module`] is the result of evaluating a module source or running a
//! catalog module body: an ordered list of named attributes plus an optional
//! export allowlist. A [`Namespace`] is the handle the lifecycle manager
//! records. Catalog imports share one namespace between every importer and
//! re-execute it in place, so the body sits behind a lock and is swapped as a
//! whole.

use std::sync::{Arc, PoisonError, RwLock};

use crate::capability::Capability;

/// A named member of a module.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A loader or unloader descriptor.
    Capability(Arc<Capability>),
    /// Any other data the module defines.
    Value(serde_json::Value),
}

impl Attribute {
    /// Returns the descriptor when the attribute is one.
    #[must_use]
    pub const fn as_capability(&self) -> Option<&Arc<Capability>> {
        match self {
            Self::Capability(capability) => Some(capability),
            Self::Value(_) => None,
        }
    }

    /// Returns the plain value when the attribute is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Capability(_) => None,
        }
    }
}

impl From<Capability> for Attribute {
    fn from(capability: Capability) -> Self {
        Self::Capability(Arc::new(capability))
    }
}

impl From<serde_json::Value> for Attribute {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Ordered attributes of an evaluated module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    attributes: Vec<(String, Attribute)>,
    exports: Option<Vec<String>>,
}

impl Module {
    /// Starts building a module.
    #[must_use]
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|entry| entry.0 == name)
            .map(|entry| &entry.1)
    }

    /// Returns the attribute at `position` in declaration order.
    #[must_use]
    pub fn attribute_at(&self, position: usize) -> Option<(&str, &Attribute)> {
        self.attributes
            .get(position)
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    /// Iterates attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    /// Returns the export allowlist, if the module declares one.
    #[must_use]
    pub fn exports(&self) -> Option<&[String]> {
        self.exports.as_deref()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` when the module defines nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Builder for [`Module`].
///
/// Defining a name twice replaces the earlier attribute but keeps its
/// original position.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Defines an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: impl Into<Attribute>) -> Self {
        let name = name.into();
        let attribute = attribute.into();
        match self
            .module
            .attributes
            .iter_mut()
            .find(|entry| entry.0 == name)
        {
            Some(entry) => entry.1 = attribute,
            None => self.module.attributes.push((name, attribute)),
        }
        self
    }

    /// Defines a capability attribute.
    #[must_use]
    pub fn capability(self, name: impl Into<String>, capability: Capability) -> Self {
        self.attribute(name, capability)
    }

    /// Defines a plain value attribute.
    #[must_use]
    pub fn value(self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attribute(name, Attribute::Value(value.into()))
    }

    /// Declares the export allowlist.
    #[must_use]
    pub fn exports<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.module.exports = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Finishes the module.
    #[must_use]
    pub fn build(self) -> Module {
        self.module
    }
}

/// Shared handle to a materialised module.
///
/// Clones refer to the same body. [`Namespace::replace`] swaps the body for
/// every holder at once, which is how in-place re-execution is modelled.
#[derive(Debug, Clone)]
pub struct Namespace {
    body: Arc<RwLock<Arc<Module>>>,
}

impl Namespace {
    /// Wraps a freshly evaluated module.
    #[must_use]
    pub fn new(module: Module) -> Self {
        Self {
            body: Arc::new(RwLock::new(Arc::new(module))),
        }
    }

    /// Returns a snapshot of the current body.
    #[must_use]
    pub fn module(&self) -> Arc<Module> {
        let guard = self.body.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replaces the body in place and returns the previous one.
    pub fn replace(&self, module: Module) -> Arc<Module> {
        self.swap(Arc::new(module))
    }

    /// Puts back a body previously obtained from [`Namespace::module`].
    pub fn restore(&self, body: Arc<Module>) {
        self.swap(body);
    }

    /// Returns `true` when both handles refer to the same namespace.
    #[must_use]
    pub fn ptr_eq(left: &Self, right: &Self) -> bool {
        Arc::ptr_eq(&left.body, &right.body)
    }

    fn swap(&self, body: Arc<Module>) -> Arc<Module> {
        let mut guard = self.body.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, body)
    }
}

impl From<Module> for Namespace {
    fn from(module: Module) -> Self {
        Self::new(module)
    }
}
