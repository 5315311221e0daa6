//! Hot loading, unloading and reloading of modules in a running process.
//!
//! The `hotswap` crate manages units of dynamically supplied code, called
//! modules, on behalf of a long-lived [`Runtime`]. A module is a set of named
//! attributes; the ones wrapped with [`as_loader`] or [`as_unloader`] are run
//! to register behaviour with the runtime or remove it again. The crate never
//! interprets what a module registers.
//!
//! # Architecture
//!
//! - [`runtime`] defines the [`Runtime`] trait and [`Client`], the standard
//!   implementation recording registered [`Unit`]s.
//! - [`capability`] tags callbacks as loaders or unloaders, and [`scanner`]
//!   discovers them inside a module [`Namespace`].
//! - [`strategy`] imports modules either from source files
//!   ([`PathStrategy`], evaluated by [`TomlModuleEvaluator`] by default) or
//!   from a [`ModuleCatalog`] of logically named modules.
//! - [`lifecycle`] is the state machine behind load, unload and reload,
//!   including the rollback of a failed reload.
//! - [`loader`] routes [`ModuleSpec`]s to the right identity space and runs
//!   batches.
//!
//! # Example
//!
//! ```
//! use hotswap::{Client, Module, ModuleLoader, Runtime, Unit, as_loader, as_unloader};
//!
//! let mut loader = ModuleLoader::default();
//! loader.catalog().define("ext.greeter", || {
//!     Ok(Module::builder()
//!         .capability("setup", as_loader(|runtime: &mut dyn Runtime| {
//!             runtime.register(Unit::component("greeter"))?;
//!             Ok(())
//!         }))
//!         .capability("teardown", as_unloader(|runtime: &mut dyn Runtime| {
//!             runtime.deregister(&Unit::component("greeter"))?;
//!             Ok(())
//!         }))
//!         .build())
//! });
//!
//! let mut client = Client::new();
//! loader.load_many(["ext.greeter"], &mut client).expect("module loads");
//! loader.reload_many(["ext.greeter"], &mut client).expect("module reloads");
//! assert_eq!(client.units(), [Unit::component("greeter")]);
//! ```

pub mod capability;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod loader;
pub mod namespace;
pub mod runtime;
pub mod scanner;
pub mod source;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use self::capability::{Capability, CapabilityKind, as_loader, as_unloader};
pub use self::error::{BoxError, CapabilityError, ImportError, ModuleError, ModuleState};
pub use self::identity::{ModuleName, ModulePath, ModuleTable};
pub use self::lifecycle::{ImportTask, ModuleManager, Operation, PendingImport, Resumption, Step};
pub use self::loader::{ModuleLoader, ModuleSpec};
pub use self::namespace::{Attribute, Module, ModuleBuilder, Namespace};
pub use self::runtime::{Client, Runtime, RuntimeError, RuntimeKind, Unit, UnitKind, runtime_kind};
pub use self::scanner::{Capabilities, collect};
pub use self::source::{SourceError, TomlModuleEvaluator, parse_module};
pub use self::strategy::{
    CatalogStrategy, ImportStrategy, ModuleBody, ModuleCatalog, PathStrategy, SourceEvaluator,
};
