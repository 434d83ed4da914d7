//! Target function declarations.
//!
//! Extracts from a parsed `fn` item everything the interception preamble needs:
//! the lookup key, parameter identifiers, and one typed result slot per result.

use proc_macro2::Ident;
use quote::ToTokens;
use syn::visit::Visit;
use syn::{FnArg, Pat, ReturnType, Type};

use crate::scope::{NameAllocator, ARG_PREFIX, HOOK_NAME, RESULT_PREFIX};

#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// Identifier the argument is bound to once the signature is rewritten.
    pub ident: Ident,
    pub ty: Type,
    /// Original pattern when it was not a plain identifier. It is restored with
    /// a `let` after the preamble, except for `_`.
    pub rebind: Option<Pat>,
}

#[derive(Debug, Clone)]
pub struct ResultDecl {
    /// Always synthesized: Rust results carry no names.
    pub ident: Ident,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct TargetFunctionDecl {
    /// Registry key: the function's own name, prefixed by its inline module path.
    pub key: String,
    pub ident: Ident,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ResultDecl>,
    /// The declared return type is a tuple, so a single result is still
    /// returned as `(x,)`.
    pub tuple_return: bool,
    /// Binding for the looked-up override.
    pub hook: Ident,
}

/// Why a function cannot be intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported(pub String);

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn qualified_name(module_path: &[String], ident: &Ident) -> String {
    if module_path.is_empty() {
        ident.to_string()
    } else {
        format!("{}::{}", module_path.join("::"), ident)
    }
}

impl TargetFunctionDecl {
    pub fn from_item(func: &syn::ItemFn, module_path: &[String]) -> Result<Self, Unsupported> {
        check_supported(func)?;

        let mut names = NameAllocator::for_function(func);
        let hook = names.fresh(HOOK_NAME);

        let mut params = Vec::with_capacity(func.sig.inputs.len());
        for (index, input) in func.sig.inputs.iter().enumerate() {
            let FnArg::Typed(pat_type) = input else {
                return Err(Unsupported("methods with a `self` receiver".into()));
            };
            let ty = (*pat_type.ty).clone();
            match &*pat_type.pat {
                Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                    params.push(ParamDecl {
                        ident: pat.ident.clone(),
                        ty,
                        rebind: None,
                    });
                }
                other => {
                    params.push(ParamDecl {
                        ident: names.fresh(&format!("{ARG_PREFIX}{index}")),
                        ty,
                        rebind: Some(other.clone()),
                    });
                }
            }
        }

        let results = result_types(&func.sig.output)
            .into_iter()
            .enumerate()
            .map(|(index, ty)| ResultDecl {
                ident: names.fresh(&format!("{RESULT_PREFIX}{index}")),
                ty,
            })
            .collect();

        Ok(Self {
            key: qualified_name(module_path, &func.sig.ident),
            ident: func.sig.ident.clone(),
            params,
            results,
            tuple_return: returns_tuple(&func.sig.output),
            hook,
        })
    }
}

/// Result types of a return type: none for `()`, one per element for a tuple.
pub fn result_types(output: &ReturnType) -> Vec<Type> {
    match output {
        ReturnType::Default => Vec::new(),
        ReturnType::Type(_, ty) => spread(ty),
    }
}

/// Whether the return type is a non-empty tuple, looking through parentheses.
///
/// A type alias to a tuple is not seen through: it is one result.
pub fn returns_tuple(output: &ReturnType) -> bool {
    fn is_tuple(ty: &Type) -> bool {
        match ty {
            Type::Tuple(tuple) => !tuple.elems.is_empty(),
            Type::Paren(paren) => is_tuple(&paren.elem),
            Type::Group(group) => is_tuple(&group.elem),
            _ => false,
        }
    }
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => is_tuple(ty),
    }
}

fn spread(ty: &Type) -> Vec<Type> {
    match ty {
        Type::Tuple(tuple) => tuple.elems.iter().cloned().collect(),
        Type::Paren(paren) => spread(&paren.elem),
        Type::Group(group) => spread(&group.elem),
        other => vec![other.clone()],
    }
}

pub fn check_supported(func: &syn::ItemFn) -> Result<(), Unsupported> {
    let sig = &func.sig;
    if sig.constness.is_some() {
        return Err(Unsupported("`const fn` cannot consult the registry".into()));
    }
    if !sig.generics.params.is_empty() {
        return Err(Unsupported("generic or lifetime parameters".into()));
    }
    if sig.variadic.is_some() {
        return Err(Unsupported("variadic parameters".into()));
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        if matches!(**ty, Type::Never(_)) {
            return Err(Unsupported("functions returning `!`".into()));
        }
    }

    for input in &sig.inputs {
        match input {
            FnArg::Receiver(_) => {
                return Err(Unsupported("methods with a `self` receiver".into()));
            }
            FnArg::Typed(pat_type) => check_static(&pat_type.ty)?,
        }
    }
    for ty in result_types(&sig.output) {
        check_static(&ty)?;
    }
    Ok(())
}

/// Arguments and results travel as `dyn Any`, which requires `'static` types.
fn check_static(ty: &Type) -> Result<(), Unsupported> {
    let mut check = StaticCheck::default();
    check.visit_type(ty);
    match check.offending {
        Some(reason) => Err(Unsupported(format!(
            "type `{}` is not `'static` ({reason})",
            ty.to_token_stream()
        ))),
        None => Ok(()),
    }
}

/// Standard library types whose first generic parameter is a lifetime. Naming
/// one without a lifetime argument elides it. User types with an elided
/// lifetime are not recognised and must be excluded by name.
const BORROWING_STD_TYPES: &[&str] = &[
    "Arguments",
    "Bytes",
    "CharIndices",
    "Chars",
    "Components",
    "Cow",
    "Drain",
    "Formatter",
    "Iter",
    "IterMut",
    "Lines",
    "MutexGuard",
    "Ref",
    "RefMut",
    "RwLockReadGuard",
    "RwLockWriteGuard",
    "Split",
    "SplitWhitespace",
    "StderrLock",
    "StdinLock",
    "StdoutLock",
];

fn has_lifetime_argument(arguments: &syn::PathArguments) -> bool {
    match arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .any(|arg| matches!(arg, syn::GenericArgument::Lifetime(_))),
        _ => false,
    }
}

#[derive(Default)]
struct StaticCheck {
    offending: Option<String>,
}

impl StaticCheck {
    fn flag(&mut self, reason: impl Into<String>) {
        if self.offending.is_none() {
            self.offending = Some(reason.into());
        }
    }
}

impl<'ast> Visit<'ast> for StaticCheck {
    fn visit_lifetime(&mut self, lifetime: &'ast syn::Lifetime) {
        if lifetime.ident != "static" {
            self.flag(format!("lifetime `{lifetime}`"));
        }
    }

    fn visit_type_reference(&mut self, reference: &'ast syn::TypeReference) {
        if reference.lifetime.is_none() {
            self.flag("elided reference lifetime");
        }
        syn::visit::visit_type_reference(self, reference);
    }

    fn visit_type_path(&mut self, path: &'ast syn::TypePath) {
        if let Some(last) = path.path.segments.last() {
            let name = last.ident.to_string();
            if BORROWING_STD_TYPES.contains(&name.as_str()) && !has_lifetime_argument(&last.arguments) {
                self.flag(format!("elided lifetime in `{name}`"));
            }
        }
        syn::visit::visit_type_path(self, path);
    }

    fn visit_type_impl_trait(&mut self, _: &'ast syn::TypeImplTrait) {
        self.flag("`impl Trait`");
    }

    fn visit_type_infer(&mut self, _: &'ast syn::TypeInfer) {
        self.flag("inferred type");
    }

    fn visit_type_macro(&mut self, _: &'ast syn::TypeMacro) {
        self.flag("type macro");
    }

    fn visit_type_bare_fn(&mut self, _: &'ast syn::TypeBareFn) {
        // Function pointers are 'static whatever lifetimes their signature mentions.
    }
}
