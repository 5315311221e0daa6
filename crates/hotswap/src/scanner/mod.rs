//! Discovery of loaders and unloaders inside a module namespace.
//!
//! With an export allowlist, exactly the listed names are considered, in
//! declared order, regardless of leading underscores. Without one, every
//! attribute whose name does not start with `_` is considered, in declaration
//! order. Names that are missing or not descriptors are skipped silently.

use std::sync::Arc;

use crate::capability::{Capability, CapabilityKind};
use crate::namespace::{Module, Namespace};

/// Lazy, single-pass iterator over the descriptors of one module.
///
/// The iterator works on a snapshot of the module body taken by [`collect`],
/// so an in-place re-execution of the namespace does not affect a scan that
/// is already under way.
#[derive(Debug)]
pub struct Capabilities {
    module: Arc<Module>,
    wanted: CapabilityKind,
    cursor: usize,
}

/// Scans `namespace` for descriptors exposing `wanted`.
///
/// # Example
///
/// ```
/// use hotswap::{CapabilityKind, Module, Namespace, as_loader, as_unloader, collect};
///
/// let namespace = Namespace::new(
///     Module::builder()
///         .capability("setup", as_loader(|_| Ok(())))
///         .capability("teardown", as_unloader(|_| Ok(())))
///         .capability("_private", as_loader(|_| Ok(())))
///         .build(),
/// );
/// assert_eq!(collect(&namespace, CapabilityKind::Load).count(), 1);
/// ```
#[must_use]
pub fn collect(namespace: &Namespace, wanted: CapabilityKind) -> Capabilities {
    Capabilities {
        module: namespace.module(),
        wanted,
        cursor: 0,
    }
}

impl Capabilities {
    fn matching(&self, name: &str) -> Option<Arc<Capability>> {
        self.module
            .get(name)
            .and_then(|attribute| attribute.as_capability())
            .filter(|capability| capability.exposes(self.wanted))
            .cloned()
    }

    fn next_exported(&mut self) -> Option<Option<Arc<Capability>>> {
        let name = self.module.exports()?.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(self.matching(&name))
    }

    fn next_public(&mut self) -> Option<Option<Arc<Capability>>> {
        let (name, attribute) = self.module.attribute_at(self.cursor)?;
        self.cursor += 1;
        if name.starts_with('_') {
            return Some(None);
        }
        Some(
            attribute
                .as_capability()
                .filter(|capability| capability.exposes(self.wanted))
                .cloned(),
        )
    }
}

impl Iterator for Capabilities {
    type Item = Arc<Capability>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = if self.module.exports().is_some() {
                self.next_exported()?
            } else {
                self.next_public()?
            };
            if candidate.is_some() {
                return candidate;
            }
        }
    }
}
