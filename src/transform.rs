//! Source transformer: inserts an interception preamble at the head of target
//! function bodies and re-emits the file.
//!
//! Only items at crate level and inside inline `mod { .. }` blocks are
//! considered; function bodies, `impl` blocks and `#[cfg(test)]` modules are
//! left untouched.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use syn::punctuated::Punctuated;
use syn::{FnArg, Item, ItemFn, Pat, PatIdent, Token};

use crate::codegen::{build_preamble, parse_runtime_path, DEFAULT_RUNTIME_PATH};
use crate::error::Error;
use crate::parse::{emit_source, parse_source, read_source};
use crate::scope::NameAllocator;
use crate::signature::{qualified_name, TargetFunctionDecl};

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Which functions of a file get instrumented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FunctionPolicy {
    /// Every function that can be intercepted, minus `exclude` (matched
    /// against both the bare and the qualified name) and test functions.
    All { exclude: Vec<String> },
    /// Exactly these qualified names; each must exist and be interceptable.
    Named { names: Vec<String> },
}

impl Default for FunctionPolicy {
    fn default() -> Self {
        FunctionPolicy::All {
            exclude: vec!["main".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    pub policy: FunctionPolicy,
    /// Path generated code uses to reach `mockexec::runtime`.
    pub runtime_path: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            policy: FunctionPolicy::default(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

impl TransformOptions {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            policy: FunctionPolicy::Named {
                names: names.into_iter().map(Into::into).collect(),
            },
            ..Self::default()
        }
    }

    /// Stable text identifying these options, mixed into cache keys.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFunction {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub source: String,
    /// Registry keys of the instrumented functions, in source order.
    pub instrumented: Vec<String>,
    pub skipped: Vec<SkippedFunction>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn transform_file(path: &Path, options: &TransformOptions) -> Result<TransformOutput, Error> {
    let source = read_source(path)?;
    transform_source(&source, &path.display().to_string(), options)
}

pub fn transform_source(
    source: &str,
    file: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, Error> {
    let mut ast = parse_source(source, file)?;
    let runtime = parse_runtime_path(&options.runtime_path).map_err(|err| {
        Error::Config(format!(
            "runtime path `{}` is not a Rust path: {err}",
            options.runtime_path
        ))
    })?;

    let mut instrumenter = Instrumenter {
        file,
        policy: &options.policy,
        runtime,
        instrumented: Vec::new(),
        skipped: Vec::new(),
        resolved: HashSet::new(),
    };
    instrumenter.visit_items(&mut ast.items, &mut Vec::new())?;

    if let FunctionPolicy::Named { names } = &options.policy {
        if let Some(missing) = names.iter().find(|name| !instrumenter.resolved.contains(*name)) {
            return Err(Error::UnresolvedTarget {
                file: file.to_string(),
                name: missing.clone(),
            });
        }
    }

    let Instrumenter {
        instrumented,
        skipped,
        ..
    } = instrumenter;
    let source = emit_source(&ast, file)?;
    Ok(TransformOutput {
        source,
        instrumented,
        skipped,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTRUMENTER
// ═══════════════════════════════════════════════════════════════════════════════

struct Instrumenter<'a> {
    file: &'a str,
    policy: &'a FunctionPolicy,
    runtime: syn::Path,
    instrumented: Vec<String>,
    skipped: Vec<SkippedFunction>,
    /// Named targets found in the file, instrumented or already instrumented.
    resolved: HashSet<String>,
}

impl Instrumenter<'_> {
    fn visit_items(&mut self, items: &mut [Item], module_path: &mut Vec<String>) -> Result<(), Error> {
        for item in items {
            match item {
                Item::Fn(func) => self.visit_fn(func, module_path)?,
                Item::Mod(module) => {
                    if is_cfg_test(&module.attrs) {
                        continue;
                    }
                    let Some((_, content)) = &mut module.content else {
                        continue;
                    };
                    module_path.push(module.ident.to_string());
                    let result = self.visit_items(content, module_path);
                    module_path.pop();
                    result?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_fn(&mut self, func: &mut ItemFn, module_path: &[String]) -> Result<(), Error> {
        let key = qualified_name(module_path, &func.sig.ident);

        match self.policy {
            FunctionPolicy::Named { names } => {
                if !names.contains(&key) {
                    return Ok(());
                }
                self.resolved.insert(key.clone());
            }
            FunctionPolicy::All { exclude } => {
                let bare = func.sig.ident.to_string();
                if exclude.contains(&key) || exclude.contains(&bare) {
                    return Ok(());
                }
                if is_test_fn(&func.attrs) {
                    return Ok(());
                }
            }
        }

        if NameAllocator::for_function(func).has_reserved() {
            tracing::debug!(function = %key, "already instrumented, leaving as is");
            self.skip(key, "already instrumented");
            return Ok(());
        }

        let decl = match TargetFunctionDecl::from_item(func, module_path) {
            Ok(decl) => decl,
            Err(reason) => {
                if matches!(self.policy, FunctionPolicy::Named { .. }) {
                    return Err(Error::UnsupportedSignature {
                        file: self.file.to_string(),
                        name: key,
                        reason: reason.to_string(),
                    });
                }
                tracing::debug!(function = %key, %reason, "skipping function");
                self.skip(key, reason.to_string());
                return Ok(());
            }
        };

        instrument(func, &decl, &self.runtime);
        tracing::debug!(
            function = %key,
            params = decl.params.len(),
            results = decl.results.len(),
            "instrumented"
        );
        self.instrumented.push(key);
        Ok(())
    }

    fn skip(&mut self, name: String, reason: impl Into<String>) {
        self.skipped.push(SkippedFunction {
            name,
            reason: reason.into(),
        });
    }
}

/// Rename pattern parameters and prepend the preamble; the original
/// statements follow it unchanged.
fn instrument(func: &mut ItemFn, decl: &TargetFunctionDecl, runtime: &syn::Path) {
    for (input, param) in func.sig.inputs.iter_mut().zip(&decl.params) {
        if param.rebind.is_none() {
            continue;
        }
        if let FnArg::Typed(pat_type) = input {
            *pat_type.pat = Pat::Ident(PatIdent {
                attrs: Vec::new(),
                by_ref: None,
                mutability: None,
                ident: param.ident.clone(),
                subpat: None,
            });
        }
    }

    let mut stmts = build_preamble(decl, runtime);
    stmts.append(&mut func.block.stmts);
    func.block.stmts = stmts;
}

/// `#[cfg(test)]`, also nested in `all(..)` or `any(..)`. `not(test)` does not count.
fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Meta>()
                .map(|meta| cfg_mentions_test(&meta))
                .unwrap_or(false)
    })
}

fn cfg_mentions_test(meta: &syn::Meta) -> bool {
    match meta {
        syn::Meta::Path(path) => path.is_ident("test"),
        syn::Meta::List(list) if list.path.is_ident("all") || list.path.is_ident("any") => list
            .parse_args_with(Punctuated::<syn::Meta, Token![,]>::parse_terminated)
            .map(|nested| nested.iter().any(cfg_mentions_test))
            .unwrap_or(false),
        _ => false,
    }
}

/// `#[test]`, `#[bench]`, and runtime-provided variants such as `#[tokio::test]`.
fn is_test_fn(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .map(|segment| segment.ident == "test" || segment.ident == "bench")
            .unwrap_or(false)
    })
}
