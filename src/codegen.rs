//! Codegen module for mockexec
//!
//! Builds the interception preamble placed at the head of an instrumented
//! function body.

use quote::quote;
use syn::{Path, Stmt};

use crate::signature::TargetFunctionDecl;

pub const DEFAULT_RUNTIME_PATH: &str = "::mockexec::runtime";

pub fn parse_runtime_path(path: &str) -> Result<Path, syn::Error> {
    syn::parse_str(path)
}

/// Statements guarding the original body of `decl`.
///
/// The override is looked up before any argument is moved into a [`Value`],
/// so on a miss the original body still owns every parameter.
///
/// [`Value`]: crate::runtime::Value
pub fn build_preamble(decl: &TargetFunctionDecl, runtime: &Path) -> Vec<Stmt> {
    let key = &decl.key;
    let hook = &decl.hook;
    let args = decl.params.iter().map(|param| &param.ident);
    let slots: Vec<_> = decl.results.iter().map(|result| &result.ident).collect();

    let slot_decls = decl.results.iter().map(|result| {
        let ident = &result.ident;
        let ty = &result.ty;
        quote! {
            let mut #ident = #runtime::Slot::<#ty>::empty();
        }
    });

    let early_return = match slots.as_slice() {
        [] => quote! { return; },
        [only] if decl.tuple_return => quote! { return (#only.into_inner(),); },
        [only] => quote! { return #only.into_inner(); },
        many => quote! { return (#(#many.into_inner()),*); },
    };

    let guard: Stmt = syn::parse_quote! {
        if let ::core::option::Option::Some(#hook) = #runtime::lookup(#key) {
            #(#slot_decls)*
            #hook.dispatch(
                ::std::vec![#(#runtime::Value::new(#args)),*],
                &mut [#(&mut #slots as &mut dyn #runtime::ResultSlot),*],
            );
            #early_return
        }
    };

    let mut stmts = vec![guard];
    for param in &decl.params {
        let Some(pat) = &param.rebind else { continue };
        if matches!(pat, syn::Pat::Wild(_)) {
            continue;
        }
        let ident = &param.ident;
        stmts.push(syn::parse_quote! {
            let #pat = #ident;
        });
    }
    stmts
}
