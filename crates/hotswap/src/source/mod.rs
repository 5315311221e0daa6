//! Declarative TOML module sources.
//!
//! A module file lists named attributes. Attributes tagged with a
//! `capability` become loaders or unloaders that register or deregister the
//! listed units in order; the rest carry a plain `value`.
//!
//! ```toml
//! exports = ["load_greeter", "unload_greeter"]
//!
//! [[attribute]]
//! name = "load_greeter"
//! capability = "loader"
//! units = [{ kind = "component", name = "greeter" }]
//!
//! [[attribute]]
//! name = "unload_greeter"
//! capability = "unloader"
//! units = [{ kind = "component", name = "greeter" }]
//!
//! [[attribute]]
//! name = "version"
//! value = 3
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::capability::{Capability, CapabilityKind, as_loader, as_unloader};
use crate::error::BoxError;
use crate::namespace::{Attribute, Module};
use crate::runtime::Unit;
use crate::strategy::SourceEvaluator;

/// Errors raised while evaluating a TOML module source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file is not a valid module document.
    #[error("invalid module source: {0}")]
    Parse(#[source] Box<toml::de::Error>),

    /// An attribute is neither a capability nor a value.
    #[error("attribute `{name}` needs either `capability` or `value`")]
    MissingValue {
        /// Attribute name.
        name: String,
    },

    /// An attribute declares both a capability and a value.
    #[error("attribute `{name}` cannot declare both `capability` and `value`")]
    Conflicting {
        /// Attribute name.
        name: String,
    },

    /// A plain value cannot be represented as JSON.
    #[error("attribute `{name}` has an unsupported value: {source}")]
    Value {
        /// Attribute name.
        name: String,
        /// Conversion failure.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDocument {
    #[serde(default)]
    exports: Option<Vec<String>>,
    #[serde(default, rename = "attribute")]
    attributes: Vec<AttributeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeDocument {
    name: String,
    #[serde(default)]
    capability: Option<CapabilityKind>,
    #[serde(default = "default_standard_impl")]
    standard_impl: bool,
    #[serde(default)]
    units: Vec<Unit>,
    #[serde(default)]
    value: Option<toml::Value>,
}

const fn default_standard_impl() -> bool {
    true
}

impl AttributeDocument {
    fn into_attribute(self) -> Result<(String, Attribute), SourceError> {
        let Self {
            name,
            capability,
            standard_impl,
            units,
            value,
        } = self;
        match (capability, value) {
            (Some(kind), None) => {
                let descriptor = unit_capability(kind, units).standard_impl(standard_impl);
                Ok((name, Attribute::from(descriptor)))
            }
            (None, Some(raw)) => match serde_json::to_value(raw) {
                Ok(json) => Ok((name, Attribute::Value(json))),
                Err(source) => Err(SourceError::Value { name, source }),
            },
            (Some(_), Some(_)) => Err(SourceError::Conflicting { name }),
            (None, None) => Err(SourceError::MissingValue { name }),
        }
    }
}

fn unit_capability(kind: CapabilityKind, units: Vec<Unit>) -> Capability {
    let shared = Arc::new(units);
    match kind {
        CapabilityKind::Load => as_loader(move |runtime| {
            for unit in shared.iter() {
                runtime.register(unit.clone())?;
            }
            Ok(())
        }),
        CapabilityKind::Unload => as_unloader(move |runtime| {
            for unit in shared.iter() {
                runtime.deregister(unit)?;
            }
            Ok(())
        }),
    }
}

/// Parses a TOML module source into a [`Module`].
///
/// # Errors
///
/// Returns a [`SourceError`] when the document is malformed.
pub fn parse_module(source: &str) -> Result<Module, SourceError> {
    let document: ModuleDocument =
        toml::from_str(source).map_err(|error| SourceError::Parse(Box::new(error)))?;
    let mut builder = Module::builder();
    for attribute in document.attributes {
        let (name, member) = attribute.into_attribute()?;
        builder = builder.attribute(name, member);
    }
    if let Some(exports) = document.exports {
        builder = builder.exports(exports);
    }
    Ok(builder.build())
}

/// Default [`SourceEvaluator`] understanding TOML module files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlModuleEvaluator;

impl SourceEvaluator for TomlModuleEvaluator {
    fn evaluate(&self, _path: &Path, source: &str) -> Result<Module, BoxError> {
        Ok(parse_module(source)?)
    }
}
