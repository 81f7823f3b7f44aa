//! Syntactic pre-filter over the forest.

use syn::visit::{self, Visit};
use syn::{Block, Item, ItemMod, ItemStruct, ItemUse};

use crate::forest::{ModulePath, SourceTree, is_test_only, item_ident};
use crate::host::SyntaxReceiver;
use crate::scope::{Scope, ScopeId};

/// A struct declaration carrying at least one attribute.
#[derive(Debug, Clone, Copy)]
pub struct CandidateDeclaration<'ast> {
    pub item: &'ast ItemStruct,
    pub scope: ScopeId,
}

/// Records candidate structs and the scopes they live in, in traversal order.
#[derive(Debug, Default)]
pub struct DeclarationCollector<'ast> {
    candidates: Vec<CandidateDeclaration<'ast>>,
    scopes: Vec<Scope<'ast>>,
    stack: Vec<ScopeId>,
}

impl<'ast> DeclarationCollector<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[CandidateDeclaration<'ast>] {
        &self.candidates
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'ast> {
        &self.scopes[id]
    }

    fn open_scope(&mut self, module: ModulePath) {
        self.scopes.push(Scope::new(module));
        self.stack.push(self.scopes.len() - 1);
    }

    fn current(&mut self) -> Option<&mut Scope<'ast>> {
        let id = *self.stack.last()?;
        self.scopes.get_mut(id)
    }
}

impl<'ast> SyntaxReceiver<'ast> for DeclarationCollector<'ast> {
    fn enter_tree(&mut self, tree: &'ast SourceTree) {
        self.stack.clear();
        self.open_scope(tree.module.clone());
    }
}

impl<'ast> Visit<'ast> for DeclarationCollector<'ast> {
    fn visit_item(&mut self, item: &'ast Item) {
        if let Some(ident) = item_ident(item)
            && let Some(scope) = self.current()
        {
            scope.declared.insert(ident.to_string());
        }
        visit::visit_item(self, item);
    }

    fn visit_item_struct(&mut self, item: &'ast ItemStruct) {
        if item.attrs.is_empty() {
            return;
        }
        if let Some(&scope) = self.stack.last() {
            self.candidates.push(CandidateDeclaration { item, scope });
        }
    }

    fn visit_item_use(&mut self, item: &'ast ItemUse) {
        if let Some(scope) = self.current() {
            scope.uses.push(item);
        }
    }

    fn visit_item_mod(&mut self, item: &'ast ItemMod) {
        let Some((_, items)) = &item.content else {
            return;
        };
        if is_test_only(&item.attrs) {
            return;
        }
        let Some(parent) = self.stack.last().map(|&id| self.scopes[id].module.clone()) else {
            return;
        };

        self.open_scope(parent.child(item.ident.to_string()));
        for inner in items {
            self.visit_item(inner);
        }
        self.stack.pop();
    }

    // Items nested in function bodies are not addressable by path.
    fn visit_block(&mut self, _block: &'ast Block) {}
}
