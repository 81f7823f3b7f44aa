//! Module scopes: the `use` items and declared names of one module body, and
//! the path resolution built on top of them.

use std::collections::BTreeSet;

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, ItemUse, Token, UseGroup, UseName, UsePath, UseRename, UseTree, Visibility};

use crate::forest::{ModulePath, SemanticModel};

/// Index of a [`Scope`] inside the collector that recorded it.
pub type ScopeId = usize;

/// The name an import binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    Named(String),
    Glob,
}

/// A flattened, absolute import: `use crate::a::B as C` becomes
/// `Named("C") -> crate::a::B`. Extern paths start with an empty segment so
/// they join as `::ext::B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: ImportName,
    pub target: Vec<String>,
}

/// One module body (a file or an inline `mod`).
#[derive(Debug, Clone)]
pub struct Scope<'ast> {
    pub module: ModulePath,
    pub uses: Vec<&'ast ItemUse>,
    pub declared: BTreeSet<String>,
}

impl<'ast> Scope<'ast> {
    pub fn new(module: ModulePath) -> Self {
        Self {
            module,
            uses: Vec::new(),
            declared: BTreeSet::new(),
        }
    }

    /// A name is local when this module declares it, in source or in a tree
    /// synthesized during the pass.
    pub fn is_local(&self, name: &str, model: &SemanticModel<'_>) -> bool {
        self.declared.contains(name) || model.synthesizes(&self.module, name)
    }

    /// The scope's `use` items rewritten so they mean the same thing from any
    /// other module of the crate.
    pub fn rebased_uses(&self, model: &SemanticModel<'_>) -> Vec<ItemUse> {
        self.uses
            .iter()
            .flat_map(|item| self.rebase_use(item, model, true))
            .collect()
    }

    /// Every binding the scope's `use` items introduce, with absolute targets.
    pub fn imports(&self, model: &SemanticModel<'_>) -> Vec<Import> {
        let mut imports = Vec::new();
        for item in self.rebased_uses(model) {
            let prefix = if item.leading_colon.is_some() {
                vec![String::new()]
            } else {
                Vec::new()
            };
            flatten(&item.tree, prefix, &mut imports);
        }
        imports
    }

    /// Absolute candidates `path` may refer to from inside this scope.
    ///
    /// Resolution is an over-approximation: explicit imports, local items,
    /// glob imports and the extern prelude all contribute a candidate.
    pub fn resolve(&self, path: &syn::Path, model: &SemanticModel<'_>) -> Vec<String> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let Some(first) = segments.first() else {
            return Vec::new();
        };

        if path.leading_colon.is_some() {
            return vec![format!("::{}", segments.join("::"))];
        }

        if let Some(base) = self.keyword_base(&segments) {
            return vec![base.join("::")];
        }

        let rest = &segments[1..];
        let mut candidates = Vec::new();
        let imports = self.imports(model);

        for import in &imports {
            if let ImportName::Named(name) = &import.name
                && name == first
            {
                candidates.push(join(&import.target, rest));
            }
        }

        if self.is_local(first, model) {
            candidates.push(join(&self.module.absolute_segments(), &segments));
        }

        for import in imports.iter().filter(|import| import.name == ImportName::Glob) {
            candidates.push(join(&import.target, &segments));
        }

        candidates.push(format!("::{}", segments.join("::")));
        candidates.dedup();
        candidates
    }

    /// Absolute form of a path starting with `crate`, `self` or `super`.
    fn keyword_base(&self, segments: &[String]) -> Option<Vec<String>> {
        match segments.first().map(String::as_str) {
            Some("crate") => Some(segments.to_vec()),
            Some("self") => Some(
                self.module
                    .absolute_segments()
                    .into_iter()
                    .chain(segments[1..].iter().cloned())
                    .collect(),
            ),
            Some("super") => {
                let mut module = self.module.clone();
                let mut rest = segments;
                while rest.first().is_some_and(|s| s == "super") {
                    module = module.parent()?;
                    rest = &rest[1..];
                }
                Some(module.absolute_segments().into_iter().chain(rest.iter().cloned()).collect())
            }
            _ => None,
        }
    }

    /// Target of `name` when another `use` of this scope binds it, e.g.
    /// `pricing` in `use super::pricing; use pricing::Quote;`. Only one level
    /// of such chaining is followed.
    fn imported(&self, name: &str, skip: &ItemUse, model: &SemanticModel<'_>) -> Option<Vec<String>> {
        let mut imports = Vec::new();
        for item in self.uses.iter().filter(|item| !std::ptr::eq(**item, skip)) {
            for rebased in self.rebase_use(item, model, false) {
                let prefix = if rebased.leading_colon.is_some() {
                    vec![String::new()]
                } else {
                    Vec::new()
                };
                flatten(&rebased.tree, prefix, &mut imports);
            }
        }

        imports.into_iter().find_map(|import| match import.name {
            ImportName::Named(bound) if bound == name => Some(import.target),
            _ => None,
        })
    }

    fn rebase_use(&self, item: &ItemUse, model: &SemanticModel<'_>, follow_imports: bool) -> Vec<ItemUse> {
        let attrs: Vec<Attribute> = item
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .cloned()
            .collect();
        let make = |leading_colon: bool, tree: UseTree| ItemUse {
            attrs: attrs.clone(),
            vis: Visibility::Inherited,
            use_token: Default::default(),
            leading_colon: leading_colon.then(Default::default),
            tree,
            semi_token: Default::default(),
        };

        if item.leading_colon.is_some() {
            return vec![make(true, item.tree.clone())];
        }

        let mut roots = Vec::new();
        split_group(&item.tree, &mut roots);

        roots
            .into_iter()
            .filter_map(|tree| {
                let (first, tail) = match tree {
                    UseTree::Path(UsePath { ident, tree: rest, .. }) => (ident.to_string(), Some(rest.as_ref())),
                    UseTree::Name(UseName { ident }) | UseTree::Rename(UseRename { ident, .. }) => {
                        (ident.to_string(), None)
                    }
                    UseTree::Glob(_) | UseTree::Group(_) => return None,
                };

                match first.as_str() {
                    "crate" => Some(make(false, tree.clone())),
                    "self" | "super" => {
                        let mut segments = vec![first.clone()];
                        let mut tail = tail?;
                        while let UseTree::Path(UsePath { ident, tree: rest, .. }) = tail {
                            if first != "super" || ident != "super" {
                                break;
                            }
                            segments.push(ident.to_string());
                            tail = rest.as_ref();
                        }
                        let base = self.keyword_base(&segments)?;
                        Some(make(false, prefixed(&base, tail.clone())))
                    }
                    // `use local_item;` only re-imports a name the module already has.
                    name if self.is_local(name, model) => {
                        let tail = tail?;
                        let base = self.module.absolute_segments().into_iter().chain([first.clone()]);
                        Some(make(false, prefixed(&base.collect::<Vec<_>>(), tail.clone())))
                    }
                    name => match tail {
                        Some(tail) if follow_imports => match self.imported(name, item, model) {
                            Some(target) => match target.split_first() {
                                Some((first, rest)) if first.is_empty() => Some(make(true, prefixed(rest, tail.clone()))),
                                _ => Some(make(false, prefixed(&target, tail.clone()))),
                            },
                            None => Some(make(true, tree.clone())),
                        },
                        _ => Some(make(true, tree.clone())),
                    },
                }
            })
            .collect()
    }
}

/// Top-level `use {a::b, c};` groups become separate roots.
fn split_group<'t>(tree: &'t UseTree, roots: &mut Vec<&'t UseTree>) {
    match tree {
        UseTree::Group(UseGroup { items, .. }) => {
            for item in items {
                split_group(item, roots);
            }
        }
        other => roots.push(other),
    }
}

/// `["crate", "a"]` + `B` -> `crate::a::B`
fn prefixed(segments: &[String], tail: UseTree) -> UseTree {
    segments.iter().rev().fold(tail, |tree, segment| {
        UseTree::Path(UsePath {
            ident: Ident::new(segment, Span::call_site()),
            colon2_token: Default::default(),
            tree: Box::new(tree),
        })
    })
}

fn flatten(tree: &UseTree, prefix: Vec<String>, out: &mut Vec<Import>) {
    match tree {
        UseTree::Path(path) => {
            let mut next = prefix;
            next.push(path.ident.to_string());
            flatten(&path.tree, next, out);
        }
        UseTree::Name(UseName { ident }) if ident == "self" => {
            if let Some(last) = prefix.last().cloned() {
                out.push(Import {
                    name: ImportName::Named(last),
                    target: prefix,
                });
            }
        }
        UseTree::Name(UseName { ident }) => {
            let mut target = prefix;
            target.push(ident.to_string());
            out.push(Import {
                name: ImportName::Named(ident.to_string()),
                target,
            });
        }
        UseTree::Rename(UseRename { ident, rename, .. }) => {
            let mut target = prefix;
            target.push(ident.to_string());
            out.push(Import {
                name: ImportName::Named(rename.to_string()),
                target,
            });
        }
        UseTree::Glob(_) => out.push(Import {
            name: ImportName::Glob,
            target: prefix,
        }),
        UseTree::Group(group) => {
            let items: &Punctuated<UseTree, Token![,]> = &group.items;
            for item in items {
                flatten(item, prefix.clone(), out);
            }
        }
    }
}

fn join(base: &[String], rest: &[String]) -> String {
    base.iter().chain(rest.iter()).cloned().collect::<Vec<_>>().join("::")
}
