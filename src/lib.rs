//! # mockexec
//!
//! Compile-time function interception. Three parts cooperate:
//!
//! 1. **Interceptor**: `mockexec` is installed as `RUSTC_WRAPPER`. For compile
//!    invocations naming a target source file it swaps that argument for an
//!    instrumented copy; everything else reaches the real tool unchanged.
//!
//! 2. **Transformer**: every target function body gets a preamble that asks the
//!    override registry for a substitute under the function's own name. On a hit
//!    the arguments are dispatched to the substitute and its results returned;
//!    on a miss the original body runs exactly as written.
//!
//! 3. **Runtime**: [`runtime`] is a process-wide name-to-override table. Test
//!    code registers closures there; generated preambles consult it.
//!
//! ## Naming Invariants
//!
//! - Registry keys are the function's own name, qualified by inline module path
//!   (`store::disk::load`), never by file or crate.
//! - Synthesized identifiers start with `__mockexec_` and never shadow a name
//!   the function already uses.
//! - Instrumented copies are named `.mockexec-*.rs` and are never instrumented again.
//!
//! Crates under test only need the runtime:
//!
//! ```toml
//! [dev-dependencies]
//! mockexec = { version = "0.1", default-features = false }
//! ```

mod adapter;
mod error;
mod registry;
mod value;

pub mod runtime;

pub use error::*;

#[cfg(feature = "tool")]
pub mod cache;
#[cfg(feature = "tool")]
pub mod codegen;
#[cfg(feature = "tool")]
pub mod config;
#[cfg(feature = "tool")]
pub mod discovery;
#[cfg(feature = "tool")]
pub mod exec;
#[cfg(feature = "tool")]
pub mod interceptor;
#[cfg(feature = "tool")]
pub mod logging;
#[cfg(feature = "tool")]
pub mod parse;
#[cfg(feature = "tool")]
pub mod scope;
#[cfg(feature = "tool")]
pub mod signature;
#[cfg(feature = "tool")]
pub mod transform;

#[cfg(feature = "tool")]
pub use config::Config;
#[cfg(feature = "tool")]
pub use interceptor::{CompileInvocation, Interceptor, Plan};
#[cfg(feature = "tool")]
pub use transform::{transform_file, transform_source, TransformOptions, TransformOutput};

#[cfg(test)]
mod registry_tests;
