//! Capability descriptors marking callbacks as loaders or unloaders.
//!
//! A [`Capability`] wraps a plain callback taking the runtime. It is tagged
//! with the lifecycle role it can play, and the scanner uses those tags to
//! decide which module attributes take part in load, unload and reload.
//! Calling a descriptor through [`Capability::call`] is indistinguishable from
//! calling the wrapped callback.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BoxError, CapabilityError};
use crate::runtime::{Runtime, RuntimeKind, runtime_kind};

/// Signature shared by every loader and unloader callback.
pub type Callback = Arc<dyn Fn(&mut dyn Runtime) -> Result<(), BoxError> + Send + Sync>;

/// Lifecycle role a descriptor can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityKind {
    /// Registers behaviour with the runtime.
    #[serde(rename = "loader")]
    Load,
    /// Removes behaviour from the runtime.
    #[serde(rename = "unloader")]
    Unload,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Load => "loader",
            Self::Unload => "unloader",
        };
        formatter.write_str(label)
    }
}

/// A callback tagged with the lifecycle role it plays.
///
/// # Example
///
/// ```
/// use hotswap::{Client, Runtime, Unit, as_loader};
///
/// let loader = as_loader(|runtime: &mut dyn Runtime| {
///     runtime.register(Unit::component("greeter"))?;
///     Ok(())
/// });
///
/// let mut client = Client::new();
/// assert!(loader.load(&mut client).expect("loader runs"));
/// assert!(!loader.unload(&mut client).expect("unload is a no-op"));
/// assert_eq!(client.units().len(), 1);
/// ```
#[derive(Clone)]
pub struct Capability {
    callback: Callback,
    kind: CapabilityKind,
    standard_impl: bool,
}

impl Capability {
    fn new(callback: Callback, kind: CapabilityKind) -> Self {
        Self {
            callback,
            kind,
            standard_impl: true,
        }
    }

    /// Sets whether the descriptor only accepts the standard
    /// [`Client`](crate::Client) runtime. Defaults to `true`.
    #[must_use]
    pub const fn standard_impl(mut self, standard_impl: bool) -> Self {
        self.standard_impl = standard_impl;
        self
    }

    /// Returns the role of this descriptor.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Returns `true` for loaders.
    #[must_use]
    pub fn has_load(&self) -> bool {
        self.kind == CapabilityKind::Load
    }

    /// Returns `true` for unloaders.
    #[must_use]
    pub fn has_unload(&self) -> bool {
        self.kind == CapabilityKind::Unload
    }

    /// Returns `true` when the descriptor plays the given role.
    #[must_use]
    pub fn exposes(&self, kind: CapabilityKind) -> bool {
        self.kind == kind
    }

    /// Returns `true` when only the standard client runtime is accepted.
    #[must_use]
    pub const fn requires_standard_runtime(&self) -> bool {
        self.standard_impl
    }

    /// Returns the wrapped callback.
    #[must_use]
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Invokes the wrapped callback directly, with no role or runtime checks.
    ///
    /// # Errors
    ///
    /// Returns whatever the callback returns.
    pub fn call(&self, runtime: &mut dyn Runtime) -> Result<(), BoxError> {
        (self.callback)(runtime)
    }

    /// Runs the callback if this is a loader.
    ///
    /// Returns `Ok(false)` without doing anything for unloaders.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidRuntimeKind`] when the descriptor
    /// requires the standard runtime and `runtime` is something else, or
    /// [`CapabilityError::Callback`] carrying the callback's own error.
    pub fn load(&self, runtime: &mut dyn Runtime) -> Result<bool, CapabilityError> {
        self.invoke(CapabilityKind::Load, runtime)
    }

    /// Runs the callback if this is an unloader.
    ///
    /// Returns `Ok(false)` without doing anything for loaders.
    ///
    /// # Errors
    ///
    /// Same as [`Capability::load`].
    pub fn unload(&self, runtime: &mut dyn Runtime) -> Result<bool, CapabilityError> {
        self.invoke(CapabilityKind::Unload, runtime)
    }

    fn invoke(
        &self,
        wanted: CapabilityKind,
        runtime: &mut dyn Runtime,
    ) -> Result<bool, CapabilityError> {
        if self.kind != wanted {
            return Ok(false);
        }
        if self.standard_impl && runtime_kind(runtime) != RuntimeKind::Standard {
            return Err(CapabilityError::InvalidRuntimeKind {
                runtime: runtime.runtime_name(),
            });
        }
        debug!(capability = %self.kind, runtime = runtime.runtime_name(), "invoking capability");
        self.call(runtime).map_err(CapabilityError::Callback)?;
        Ok(true)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Capability")
            .field("kind", &self.kind)
            .field("standard_impl", &self.standard_impl)
            .finish_non_exhaustive()
    }
}

/// Wraps a callback as a loader.
///
/// The descriptor requires the standard runtime unless
/// [`Capability::standard_impl`] is set to `false`.
#[must_use]
pub fn as_loader<F>(callback: F) -> Capability
where
    F: Fn(&mut dyn Runtime) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Capability::new(Arc::new(callback), CapabilityKind::Load)
}

/// Wraps a callback as an unloader.
///
/// The descriptor requires the standard runtime unless
/// [`Capability::standard_impl`] is set to `false`.
#[must_use]
pub fn as_unloader<F>(callback: F) -> Capability
where
    F: Fn(&mut dyn Runtime) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Capability::new(Arc::new(callback), CapabilityKind::Unload)
}
