//! Shared fixtures for unit and behaviour tests.

use std::any::Any;
use std::path::Path;
use std::sync::{Arc, Mutex};

use mockall::mock;

use crate::capability::{Capability, as_loader, as_unloader};
use crate::error::BoxError;
use crate::namespace::Module;
use crate::runtime::{Runtime, RuntimeError, Unit};
use crate::strategy::SourceEvaluator;

mock! {
    pub Evaluator {}
    impl SourceEvaluator for Evaluator {
        fn evaluate(&self, path: &Path, source: &str) -> Result<Module, BoxError>;
    }
}

/// Permissive runtime that is not the standard client.
#[derive(Debug, Default)]
pub struct Recorder {
    units: Vec<Unit>,
}

impl Recorder {
    pub fn units(&self) -> &[Unit] {
        &self.units
    }
}

impl Runtime for Recorder {
    fn register(&mut self, unit: Unit) -> Result<(), RuntimeError> {
        self.units.push(unit);
        Ok(())
    }

    fn deregister(&mut self, unit: &Unit) -> Result<(), RuntimeError> {
        self.units.retain(|candidate| candidate != unit);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Ordered record of capability invocations shared between callbacks.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, label: &str) {
        self.entries
            .lock()
            .expect("call log lock")
            .push(label.to_owned());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("call log lock").clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.entries
            .lock()
            .expect("call log lock")
            .iter()
            .filter(|entry| entry.as_str() == label)
            .count()
    }

    /// Loader that records `label` each time it runs.
    pub fn loader(&self, label: &str) -> Capability {
        let log = self.clone();
        let label = label.to_owned();
        as_loader(move |_runtime| {
            log.record(&label);
            Ok(())
        })
    }

    /// Unloader that records `label` each time it runs.
    pub fn unloader(&self, label: &str) -> Capability {
        let log = self.clone();
        let label = label.to_owned();
        as_unloader(move |_runtime| {
            log.record(&label);
            Ok(())
        })
    }

    /// Loader that records `label` and then fails.
    pub fn failing_loader(&self, label: &str) -> Capability {
        let log = self.clone();
        let label = label.to_owned();
        as_loader(move |_runtime| {
            log.record(&label);
            Err(format!("{label} failed").into())
        })
    }

    /// Unloader that records `label` and then fails.
    pub fn failing_unloader(&self, label: &str) -> Capability {
        let log = self.clone();
        let label = label.to_owned();
        as_unloader(move |_runtime| {
            log.record(&label);
            Err(format!("{label} failed").into())
        })
    }

    /// Module with one loader `load:{tag}`, one unloader `unload:{tag}` and a
    /// `version` value set to `tag`.
    pub fn paired_module(&self, tag: &str) -> Module {
        Module::builder()
            .capability("setup", self.loader(&format!("load:{tag}")))
            .capability("teardown", self.unloader(&format!("unload:{tag}")))
            .value("version", tag)
            .build()
    }
}
