use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::adapter::{IntoOverride, Override};
use crate::error::DispatchError;
use crate::value::{ResultSlot, Value};

/// A registered override: the function name it answers for and its callable.
pub struct OverrideEntry {
    name: String,
    callable: Arc<dyn Override>,
}

impl OverrideEntry {
    pub fn new(name: impl Into<String>, callable: Arc<dyn Override>) -> Self {
        Self {
            name: name.into(),
            callable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> usize {
        self.callable.params()
    }

    pub fn results(&self) -> usize {
        self.callable.results()
    }

    /// Call the override and write its results into `slots`.
    ///
    /// The reported result count must equal `slots.len()`. It is checked before
    /// the override runs, so on a mismatch the override is never called and
    /// nothing is written.
    pub fn try_dispatch(
        &self,
        args: Vec<Value>,
        slots: &mut [&mut dyn ResultSlot],
    ) -> Result<(), DispatchError> {
        if self.callable.results() != slots.len() {
            return Err(DispatchError::ArityMismatch {
                name: self.name.clone(),
                declared: slots.len(),
                reported: self.callable.results(),
            });
        }

        let results = self
            .callable
            .call(args)
            .map_err(|source| DispatchError::Call {
                name: self.name.clone(),
                source,
            })?;

        if results.len() != slots.len() {
            return Err(DispatchError::ArityMismatch {
                name: self.name.clone(),
                declared: slots.len(),
                reported: results.len(),
            });
        }

        for (position, (slot, value)) in slots.iter_mut().zip(results).enumerate() {
            let expected = slot.expected_type();
            slot.fill(value).map_err(|value| DispatchError::ResultType {
                name: self.name.clone(),
                position,
                expected,
                found: value.type_name(),
            })?;
        }
        Ok(())
    }

    /// Like [`try_dispatch`](Self::try_dispatch), but a broken override is fatal.
    pub fn dispatch(&self, args: Vec<Value>, slots: &mut [&mut dyn ResultSlot]) {
        if let Err(err) = self.try_dispatch(args, slots) {
            tracing::error!(function = %self.name, error = %err, "override dispatch failed");
            panic!("mockexec: {err}");
        }
    }
}

impl fmt::Debug for OverrideEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideEntry")
            .field("name", &self.name)
            .field("params", &self.params())
            .field("results", &self.results())
            .finish()
    }
}

/// Name-to-override table shared by every instrumented call site.
///
/// Writers take the lock only to swap an already built entry in, and readers
/// clone the entry's `Arc` out, so a dispatch always sees a whole entry and
/// runs the override with no lock held.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<OverrideEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callable` under `name`, replacing (and returning) any previous entry.
    pub fn register<Args>(
        &self,
        name: impl Into<String>,
        callable: impl IntoOverride<Args>,
    ) -> Option<Arc<OverrideEntry>> {
        self.register_override(name, callable.into_override())
    }

    pub fn register_override(
        &self,
        name: impl Into<String>,
        callable: Arc<dyn Override>,
    ) -> Option<Arc<OverrideEntry>> {
        let entry = Arc::new(OverrideEntry::new(name, callable));
        tracing::debug!(
            function = %entry.name,
            params = entry.params(),
            results = entry.results(),
            "registering override"
        );
        self.insert_entry(entry)
    }

    fn insert_entry(&self, entry: Arc<OverrideEntry>) -> Option<Arc<OverrideEntry>> {
        let name = entry.name.clone();
        self.entries.write().insert(name, entry)
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.entries.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<OverrideEntry>> {
        self.entries.read().get(name).cloned()
    }

    /// Dispatch to the override registered under `name`.
    ///
    /// Returns `false` and leaves `slots` untouched when there is none.
    /// Panics when the override's results do not fit `slots`.
    pub fn dispatch(&self, name: &str, args: Vec<Value>, slots: &mut [&mut dyn ResultSlot]) -> bool {
        match self.lookup(name) {
            Some(entry) => {
                entry.dispatch(args, slots);
                true
            }
            None => false,
        }
    }

    /// Register `callable` until the returned guard drops, then restore
    /// whatever `name` resolved to before.
    pub fn scoped<Args>(
        &self,
        name: impl Into<String>,
        callable: impl IntoOverride<Args>,
    ) -> OverrideGuard<'_> {
        let name = name.into();
        let previous = self.register(name.clone(), callable);
        OverrideGuard {
            registry: self,
            name,
            previous,
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

/// Restores a registry entry on drop. See [`Registry::scoped`].
#[must_use = "the override is removed as soon as the guard is dropped"]
pub struct OverrideGuard<'a> {
    registry: &'a Registry,
    name: String,
    previous: Option<Arc<OverrideEntry>>,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.registry.insert_entry(previous);
            }
            None => {
                self.registry.unregister(&self.name);
            }
        }
    }
}
