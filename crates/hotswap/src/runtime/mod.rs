//! The runtime that loaders register behaviour with.
//!
//! The lifecycle manager never interprets what a module contributes. It only
//! hands a [`Runtime`] to each loader and unloader, which mutate it through
//! [`Runtime::register`] and [`Runtime::deregister`]. [`Client`] is the
//! standard implementation: it records the registered [`Unit`]s in
//! registration order and rejects duplicates.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Category of a registrable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A component bundling commands and listeners.
    Component,
    /// A standalone event listener.
    Listener,
    /// A client lifecycle callback.
    Callback,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Component => "component",
            Self::Listener => "listener",
            Self::Callback => "callback",
        };
        formatter.write_str(label)
    }
}

/// An opaque item a module contributes to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    kind: UnitKind,
    name: String,
}

impl Unit {
    /// Creates a unit of the given kind.
    #[must_use]
    pub fn new(kind: UnitKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a [`UnitKind::Component`] unit.
    #[must_use]
    pub fn component(name: impl Into<String>) -> Self {
        Self::new(UnitKind::Component, name)
    }

    /// Returns the unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Returns the unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.kind, self.name)
    }
}

/// Errors raised by [`Client`] when its registrations are mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A unit with the same kind and name is already registered.
    #[error("unit `{unit}` is already registered")]
    AlreadyRegistered {
        /// The rejected unit.
        unit: Unit,
    },
    /// The unit to remove was never registered.
    #[error("unit `{unit}` is not registered")]
    NotRegistered {
        /// The missing unit.
        unit: Unit,
    },
}

/// Whether a runtime is the standard [`Client`] or another implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    /// The value is a [`Client`].
    Standard,
    /// Any other [`Runtime`] implementation.
    Custom,
}

/// Long-lived object that accumulates behaviour registered by modules.
///
/// The `Any` supertrait lets [`runtime_kind`] detect the concrete
/// implementation without trusting the implementation to report it.
pub trait Runtime: Any + Send {
    /// Registers a unit.
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeError`] when the implementation refuses the unit.
    fn register(&mut self, unit: Unit) -> Result<(), RuntimeError>;

    /// Removes a previously registered unit.
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeError`] when the unit is unknown.
    fn deregister(&mut self, unit: &Unit) -> Result<(), RuntimeError>;

    /// Upcasts to `Any` for concrete-type checks.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart of [`Runtime::as_any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Type name used in diagnostics.
    fn runtime_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Reports whether a runtime is the standard [`Client`].
#[must_use]
pub fn runtime_kind(runtime: &dyn Runtime) -> RuntimeKind {
    if runtime.as_any().is::<Client>() {
        RuntimeKind::Standard
    } else {
        RuntimeKind::Custom
    }
}

/// Standard runtime recording registered units in order.
///
/// # Example
///
/// ```
/// use hotswap::{Client, Runtime, Unit};
///
/// let mut client = Client::new();
/// client.register(Unit::component("greeter")).expect("first registration");
/// assert!(client.register(Unit::component("greeter")).is_err());
/// assert_eq!(client.units().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Client {
    units: Vec<Unit>,
}

impl Client {
    /// Creates a client with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered units in registration order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Returns `true` when the unit is registered.
    #[must_use]
    pub fn contains(&self, unit: &Unit) -> bool {
        self.units.contains(unit)
    }

    /// Returns the standard client behind a runtime trait object, if it is one.
    pub fn from_runtime_mut(runtime: &mut dyn Runtime) -> Option<&mut Self> {
        runtime.as_any_mut().downcast_mut::<Self>()
    }
}

impl Runtime for Client {
    fn register(&mut self, unit: Unit) -> Result<(), RuntimeError> {
        if self.units.contains(&unit) {
            return Err(RuntimeError::AlreadyRegistered { unit });
        }
        debug!(unit = %unit, "registered unit");
        self.units.push(unit);
        Ok(())
    }

    fn deregister(&mut self, unit: &Unit) -> Result<(), RuntimeError> {
        let position = self
            .units
            .iter()
            .position(|candidate| candidate == unit)
            .ok_or_else(|| RuntimeError::NotRegistered { unit: unit.clone() })?;
        self.units.remove(position);
        debug!(unit = %unit, "deregistered unit");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
