use std::collections::HashSet;

use proc_macro2::{Ident, Span};
use syn::visit::Visit;

/// Prefix shared by every identifier the instrumenter synthesizes.
pub const RESERVED_PREFIX: &str = "__mockexec_";

pub const HOOK_NAME: &str = "__mockexec_override";
pub const ARG_PREFIX: &str = "__mockexec_arg_";
pub const RESULT_PREFIX: &str = "__mockexec_res_";

/// Every identifier spelled anywhere inside a syntax node.
#[derive(Default)]
struct IdentCollector {
    idents: HashSet<String>,
}

impl<'ast> Visit<'ast> for IdentCollector {
    fn visit_ident(&mut self, ident: &'ast Ident) {
        self.idents.insert(ident.to_string());
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        syn::visit::visit_macro(self, mac);
        // Macro bodies stay unparsed token streams; scan them as well.
        collect_token_idents(mac.tokens.clone(), &mut self.idents);
    }
}

fn collect_token_idents(tokens: proc_macro2::TokenStream, out: &mut HashSet<String>) {
    for tree in tokens {
        match tree {
            proc_macro2::TokenTree::Ident(ident) => {
                out.insert(ident.to_string());
            }
            proc_macro2::TokenTree::Group(group) => collect_token_idents(group.stream(), out),
            _ => {}
        }
    }
}

pub fn collect_idents(func: &syn::ItemFn) -> HashSet<String> {
    let mut collector = IdentCollector::default();
    collector.visit_item_fn(func);
    collector.idents
}

/// Hands out identifiers that collide with nothing already in scope.
///
/// Names are deterministic: the base name when free, otherwise the base name
/// with the first free `_N` suffix.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new(taken: HashSet<String>) -> Self {
        Self { taken }
    }

    pub fn for_function(func: &syn::ItemFn) -> Self {
        Self::new(collect_idents(func))
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// True when the function already contains synthesized identifiers,
    /// i.e. it went through the instrumenter before.
    pub fn has_reserved(&self) -> bool {
        self.taken.iter().any(|name| name.starts_with(HOOK_NAME))
    }

    pub fn fresh(&mut self, base: &str) -> Ident {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        Ident::new(&candidate, Span::call_site())
    }
}
