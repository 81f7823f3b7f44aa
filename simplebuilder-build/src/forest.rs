//! The syntax forest of a crate and the qualified-name view over it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use std::collections::HashSet;

use syn::{Attribute, Item, ItemMod, ItemStruct, ItemTrait};
use walkdir::WalkDir;

use crate::error::GenerateError;

/// Module path below the crate root, e.g. `["models", "billing"]` for
/// `crate::models::billing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Absolute segments starting with `crate`.
    pub fn absolute_segments(&self) -> Vec<String> {
        std::iter::once("crate".to_string()).chain(self.0.iter().cloned()).collect()
    }

    /// `crate::a::b::<name>`
    pub fn qualify(&self, name: &str) -> String {
        format!("{self}::{name}")
    }
}

impl<S: Into<String>> FromIterator<S> for ModulePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("crate")?;
        for segment in &self.0 {
            write!(f, "::{segment}")?;
        }
        Ok(())
    }
}

/// Where a tree came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOrigin {
    File(PathBuf),
    /// Source text produced during the pass itself.
    Synthesized(String),
}

impl fmt::Display for TreeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeOrigin::File(path) => write!(f, "{}", path.display()),
            TreeOrigin::Synthesized(name) => write!(f, "<synthesized {name}>"),
        }
    }
}

/// One parsed source file and the module it defines.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub module: ModulePath,
    pub origin: TreeOrigin,
    pub file: syn::File,
}

impl SourceTree {
    pub fn parse(module: ModulePath, origin: TreeOrigin, text: &str) -> Result<Self, GenerateError> {
        let file = syn::parse_file(text).map_err(|source| GenerateError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self { module, origin, file })
    }
}

/// All trees of a crate, in a stable order.
#[derive(Debug, Clone, Default)]
pub struct SourceForest {
    trees: Vec<SourceTree>,
}

impl SourceForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trees(trees: impl IntoIterator<Item = SourceTree>) -> Self {
        Self {
            trees: trees.into_iter().collect(),
        }
    }

    /// Load every `.rs` file below `root`, sorted by relative path.
    ///
    /// Files that fail to parse are skipped; rustc reports them anyway.
    pub fn load(root: &Path) -> Result<Self, GenerateError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|err| GenerateError::Io {
                path: err.path().unwrap_or(root).to_path_buf(),
                source: err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;
            let path = entry.path();

            if path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            if relative.components().any(|c| {
                let name = c.as_os_str().to_string_lossy();
                name.starts_with('.') || name == "target" || name == "bin"
            }) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();

        let mut forest = Self::new();
        for path in files {
            let text = fs::read_to_string(&path).map_err(|source| GenerateError::Io {
                path: path.clone(),
                source,
            })?;
            let module = compute_module_path(&path, root);
            match SourceTree::parse(module, TreeOrigin::File(path.clone()), &text) {
                Ok(tree) => forest.push(tree),
                Err(err) => log::warn!("skipping {}: {err}", path.display()),
            }
        }

        forest.retain_declared();
        log::debug!("loaded {} source trees from {}", forest.trees.len(), root.display());
        Ok(forest)
    }

    /// Drop file trees no `mod name;` declaration reaches from the crate root,
    /// including those declared only under `#[cfg(test)]`. Without a root tree
    /// nothing can be followed and every tree is kept.
    fn retain_declared(&mut self) {
        if !self.trees.iter().any(|tree| tree.module.is_root()) {
            return;
        }

        let mut by_depth: Vec<&SourceTree> = self.trees.iter().collect();
        by_depth.sort_by_key(|tree| tree.module.segments().len());

        let mut reached: Vec<&SourceTree> = Vec::new();
        for tree in by_depth {
            if tree.module.is_root() || declares_file_module(&reached, &tree.module) {
                reached.push(tree);
            } else {
                log::debug!("skipping {}: not declared by any reachable module", tree.origin);
            }
        }

        let keep: HashSet<ModulePath> = reached.into_iter().map(|tree| tree.module.clone()).collect();
        self.trees.retain(|tree| keep.contains(&tree.module));
    }

    pub fn push(&mut self, tree: SourceTree) {
        self.trees.push(tree);
    }

    pub fn extend(&mut self, other: SourceForest) {
        self.trees.extend(other.trees);
    }

    pub fn trees(&self) -> &[SourceTree] {
        &self.trees
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Whether any tree defines `module`, either as its own file or as a
    /// `mod` item (inline or out-of-line) in its parent.
    pub fn declares_module(&self, module: &ModulePath) -> bool {
        let Some(parent) = module.parent() else {
            return true;
        };
        let Some(name) = module.segments().last() else {
            return true;
        };

        self.trees.iter().any(|tree| {
            tree.module == *module
                || items_at(tree, &parent).is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| matches!(item, Item::Mod(m) if m.ident == name))
                })
        })
    }
}

/// Whether one of `trees` holds an out-of-line `mod` item for `module` that
/// is compiled outside tests.
fn declares_file_module(trees: &[&SourceTree], module: &ModulePath) -> bool {
    let (Some(parent), Some(name)) = (module.parent(), module.segments().last()) else {
        return false;
    };

    trees.iter().any(|tree| {
        items_at(tree, &parent).is_some_and(|items| {
            items.iter().any(|item| {
                matches!(item, Item::Mod(m) if m.ident == name && m.content.is_none() && !is_test_only(&m.attrs))
            })
        })
    })
}

/// `#[cfg(test)]`
pub(crate) fn is_test_only(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

/// Compute the module path from a file path.
/// e.g., "src/billing/invoice.rs" -> `crate::billing::invoice`
pub fn compute_module_path(file_path: &Path, base_path: &Path) -> ModulePath {
    let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);

    let without_extension = relative.with_extension("");
    let mut parts: Vec<&str> = without_extension
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    if let Some(last) = parts.last()
        && (*last == "mod" || *last == "lib" || *last == "main")
    {
        parts.pop();
    }

    parts.into_iter().collect()
}

/// Items of `module` as seen from `tree`, descending through inline `mod`
/// blocks when the tree sits above it.
fn items_at<'t>(tree: &'t SourceTree, module: &ModulePath) -> Option<&'t [Item]> {
    let rest = module.segments().strip_prefix(tree.module.segments())?;

    let mut items: &[Item] = &tree.file.items;
    for segment in rest {
        items = items.iter().find_map(|item| match item {
            Item::Mod(m) if m.ident == segment => m.content.as_ref().map(|(_, inner)| inner.as_slice()),
            _ => None,
        })?;
    }
    Some(items)
}

/// Splits `crate::a::B` into (`crate::a`, `B`).
fn split_qualified(qualified: &str) -> Option<(ModulePath, &str)> {
    let mut segments: Vec<&str> = qualified.split("::").collect();
    let name = segments.pop()?;
    if segments.first() != Some(&"crate") {
        return None;
    }
    Some((segments[1..].iter().copied().collect(), name))
}

/// The user's forest plus the trees synthesized during the pass.
#[derive(Debug)]
pub struct SemanticModel<'a> {
    user: &'a SourceForest,
    synthesized: Vec<SourceTree>,
}

impl<'a> SemanticModel<'a> {
    pub fn new(user: &'a SourceForest) -> Self {
        Self {
            user,
            synthesized: Vec::new(),
        }
    }

    /// Extend the model with a tree that is not part of the user's sources.
    pub fn with_source(mut self, tree: SourceTree) -> Self {
        self.synthesized.push(tree);
        self
    }

    fn trees(&self) -> impl Iterator<Item = &SourceTree> {
        self.user.trees().iter().chain(self.synthesized.iter())
    }

    fn find_item<T>(&self, qualified: &str, pick: impl Fn(&Item) -> Option<&T>) -> Option<&T> {
        let (module, name) = split_qualified(qualified)?;
        self.trees()
            .filter_map(|tree| items_at(tree, &module))
            .flat_map(|items| items.iter())
            .filter(|item| item_ident(item).is_some_and(|ident| ident == name))
            .find_map(pick)
    }

    /// Look up a struct declaration by its qualified name (`crate::a::B`).
    pub fn lookup_struct(&self, qualified: &str) -> Option<&ItemStruct> {
        self.find_item(qualified, |item| match item {
            Item::Struct(s) => Some(s),
            _ => None,
        })
    }

    /// Look up a trait declaration by its qualified name.
    pub fn lookup_trait(&self, qualified: &str) -> Option<&ItemTrait> {
        self.find_item(qualified, |item| match item {
            Item::Trait(t) => Some(t),
            _ => None,
        })
    }

    /// The `mod` item declaring `module`, inline or out-of-line.
    pub fn lookup_module(&self, module: &ModulePath) -> Option<&ItemMod> {
        let (parent, name) = (module.parent()?, module.segments().last()?);
        self.find_item(&parent.qualify(name), |item| match item {
            Item::Mod(m) => Some(m),
            _ => None,
        })
    }

    /// Whether a synthesized tree declares `name` directly inside `module`.
    pub fn synthesizes(&self, module: &ModulePath, name: &str) -> bool {
        self.synthesized.iter().any(|tree| {
            items_at(tree, module)
                .is_some_and(|items| items.iter().any(|item| item_ident(item).is_some_and(|i| i == name)))
        })
    }
}

/// Name an item introduces into its module, if any.
pub(crate) fn item_ident(item: &Item) -> Option<&syn::Ident> {
    match item {
        Item::Const(i) => Some(&i.ident),
        Item::Enum(i) => Some(&i.ident),
        Item::ExternCrate(i) => Some(i.rename.as_ref().map_or(&i.ident, |(_, rename)| rename)),
        Item::Fn(i) => Some(&i.sig.ident),
        Item::Macro(i) => i.ident.as_ref(),
        Item::Mod(i) => Some(&i.ident),
        Item::Static(i) => Some(&i.ident),
        Item::Struct(i) => Some(&i.ident),
        Item::Trait(i) => Some(&i.ident),
        Item::TraitAlias(i) => Some(&i.ident),
        Item::Type(i) => Some(&i.ident),
        Item::Union(i) => Some(&i.ident),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(module: &[&str], text: &str) -> SourceTree {
        SourceTree::parse(
            module.iter().copied().collect(),
            TreeOrigin::Synthesized("test".to_string()),
            text,
        )
        .unwrap()
    }

    #[test]
    fn test_compute_module_path() {
        let base = Path::new("src");
        assert_eq!(compute_module_path(Path::new("src/lib.rs"), base), ModulePath::root());
        assert_eq!(
            compute_module_path(Path::new("src/billing/invoice.rs"), base).to_string(),
            "crate::billing::invoice"
        );
        assert_eq!(
            compute_module_path(Path::new("src/billing/mod.rs"), base).to_string(),
            "crate::billing"
        );
    }

    #[test]
    fn module_path_navigation() {
        let path: ModulePath = ["a", "b"].into_iter().collect();
        assert_eq!(path.parent(), Some(ModulePath::from_iter(["a"])));
        assert_eq!(path.child("c").to_string(), "crate::a::b::c");
        assert_eq!(path.qualify("Item"), "crate::a::b::Item");
        assert_eq!(ModulePath::root().parent(), None);
        assert_eq!(path.absolute_segments(), vec!["crate", "a", "b"]);
    }

    #[test]
    fn looks_up_structs_in_files_and_inline_modules() {
        let forest = SourceForest::from_trees([
            tree(&[], "pub mod models; pub struct Root;"),
            tree(&["models"], "pub struct Person { pub name: String } pub mod nested { pub struct Inner; }"),
        ]);
        let model = SemanticModel::new(&forest);

        assert!(model.lookup_struct("crate::Root").is_some());
        assert_eq!(
            model.lookup_struct("crate::models::Person").map(|s| s.ident.to_string()),
            Some("Person".to_string())
        );
        assert!(model.lookup_struct("crate::models::nested::Inner").is_some());
        assert!(model.lookup_struct("crate::models::Missing").is_none());
        assert!(model.lookup_struct("models::Person").is_none());
        assert!(model.lookup_trait("crate::models::Person").is_none());
    }

    #[test]
    fn synthesized_trees_extend_the_model() {
        let forest = SourceForest::from_trees([tree(&[], "pub struct Root;")]);
        let marker = tree(&[], "pub mod reserved { pub trait Marker {} }");

        assert!(SemanticModel::new(&forest).lookup_trait("crate::reserved::Marker").is_none());

        let model = SemanticModel::new(&forest).with_source(marker);
        assert!(model.lookup_trait("crate::reserved::Marker").is_some());
        assert!(model.synthesizes(&ModulePath::root(), "reserved"));
        assert!(!model.synthesizes(&ModulePath::root(), "Root"));
    }

    #[test]
    fn detects_declared_modules() {
        let forest = SourceForest::from_trees([
            tree(&[], "mod inline { mod deeper {} } mod external;"),
            tree(&["files"], "pub struct A;"),
        ]);

        assert!(forest.declares_module(&ModulePath::from_iter(["inline"])));
        assert!(forest.declares_module(&ModulePath::from_iter(["inline", "deeper"])));
        assert!(forest.declares_module(&ModulePath::from_iter(["external"])));
        assert!(forest.declares_module(&ModulePath::from_iter(["files"])));
        assert!(!forest.declares_module(&ModulePath::from_iter(["absent"])));
    }

    #[test]
    fn keeps_only_trees_declared_from_the_root() {
        let mut forest = SourceForest::from_trees([
            tree(&[], "pub mod models; #[cfg(test)] mod fixtures; #[cfg(feature = \"extras\")] pub mod extras; pub mod shop { pub mod pricing; }"),
            tree(&["models"], "pub mod billing;"),
            tree(&["models", "billing"], "pub struct Invoice;"),
            tree(&["fixtures"], "pub struct Fixture;"),
            tree(&["extras"], "pub struct Extra;"),
            tree(&["shop", "pricing"], "pub struct Quote;"),
            tree(&["scratch"], "pub struct Orphan;"),
            tree(&["scratch", "deeper"], "pub struct Deeper;"),
        ]);
        forest.retain_declared();

        let modules: Vec<String> = forest.trees().iter().map(|tree| tree.module.to_string()).collect();
        assert_eq!(
            modules,
            vec![
                "crate",
                "crate::models",
                "crate::models::billing",
                "crate::extras",
                "crate::shop::pricing",
            ]
        );
    }

    #[test]
    fn forests_without_a_root_are_kept_whole() {
        let mut forest = SourceForest::from_trees([tree(&["models"], "pub struct A;"), tree(&["scratch"], "pub struct B;")]);
        forest.retain_declared();
        assert_eq!(forest.trees().len(), 2);
    }

    #[test]
    fn looks_up_module_items() {
        let forest = SourceForest::from_trees([
            tree(&[], "pub mod models; mod internal { pub(crate) mod deeper {} }"),
            tree(&["models"], "pub struct A;"),
        ]);
        let model = SemanticModel::new(&forest);

        assert!(matches!(
            model.lookup_module(&ModulePath::from_iter(["models"])).map(|m| &m.vis),
            Some(syn::Visibility::Public(_))
        ));
        assert!(matches!(
            model.lookup_module(&ModulePath::from_iter(["internal"])).map(|m| &m.vis),
            Some(syn::Visibility::Inherited)
        ));
        assert!(model.lookup_module(&ModulePath::from_iter(["internal", "deeper"])).is_some());
        assert!(model.lookup_module(&ModulePath::from_iter(["absent"])).is_none());
        assert!(model.lookup_module(&ModulePath::root()).is_none());
    }

    #[test]
    fn parse_errors_name_their_origin() {
        let err = SourceTree::parse(
            ModulePath::root(),
            TreeOrigin::File(PathBuf::from("src/broken.rs")),
            "pub struct {",
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("failed to parse src/broken.rs"));
    }
}
