//! Runtime half of mockexec: the process-wide override registry.
//!
//! Instrumented functions call [`lookup`] with their own name before running
//! their original body. Test setup code installs substitutes with [`register`]:
//!
//! ```
//! mockexec::runtime::register("greet", |s: String| format!("mock {s}"));
//! assert!(mockexec::runtime::global().contains("greet"));
//! ```
//!
//! This module is available without the `tool` feature, which is how crates
//! under test should depend on mockexec.

use std::sync::Arc;

use lazy_static::lazy_static;

pub use crate::adapter::{FnOverride, IntoOverride, Override, Returns};
pub use crate::error::{CallError, DispatchError};
pub use crate::registry::{OverrideEntry, OverrideGuard, Registry};
pub use crate::value::{ResultSlot, Slot, Value};

lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

/// The registry generated preambles consult.
pub fn global() -> &'static Registry {
    &GLOBAL
}

pub fn register<Args>(
    name: impl Into<String>,
    callable: impl IntoOverride<Args>,
) -> Option<Arc<OverrideEntry>> {
    global().register(name, callable)
}

pub fn register_override(
    name: impl Into<String>,
    callable: Arc<dyn Override>,
) -> Option<Arc<OverrideEntry>> {
    global().register_override(name, callable)
}

pub fn unregister(name: &str) -> bool {
    global().unregister(name)
}

pub fn clear() {
    global().clear()
}

pub fn lookup(name: &str) -> Option<Arc<OverrideEntry>> {
    global().lookup(name)
}

pub fn dispatch(name: &str, args: Vec<Value>, slots: &mut [&mut dyn ResultSlot]) -> bool {
    global().dispatch(name, args, slots)
}

pub fn scoped<Args>(
    name: impl Into<String>,
    callable: impl IntoOverride<Args>,
) -> OverrideGuard<'static> {
    global().scoped(name, callable)
}
