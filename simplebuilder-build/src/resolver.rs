//! Marker resolution and member extraction.

use syn::punctuated::Punctuated;
use syn::{Attribute, Fields, Ident, ItemStruct, ItemUse, Token, Type, Visibility};

use crate::collector::{CandidateDeclaration, DeclarationCollector};
use crate::config::MarkerMatch;
use crate::forest::{ModulePath, SemanticModel};
use crate::marker;
use crate::scope::Scope;

/// One `pub` named field of a resolved struct.
#[derive(Debug, Clone)]
pub struct ExtractedMember {
    pub ident: Ident,
    pub ty: Type,
    /// Position among the extracted members.
    pub index: usize,
}

/// Extracted members plus the number of fields left out because they are not `pub`.
#[derive(Debug, Clone, Default)]
pub struct MemberList {
    pub members: Vec<ExtractedMember>,
    pub hidden_fields: usize,
}

/// Why a marked struct's member list is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The qualified name did not lead back to a declaration.
    NotFound,
    TupleFields,
    Generic,
    /// Generated code could not name the struct.
    Private,
}

#[derive(Debug, Clone)]
pub enum Extraction {
    Members(MemberList),
    Unavailable(UnavailableReason),
}

/// Visibility of the struct, and so of its builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeVisibility {
    Public,
    Crate,
}

impl TypeVisibility {
    fn narrowest(self, other: Self) -> Self {
        match (self, other) {
            (TypeVisibility::Public, TypeVisibility::Public) => TypeVisibility::Public,
            _ => TypeVisibility::Crate,
        }
    }
}

/// How the crate root reaches a module: the narrowest visibility along its
/// `mod` chain and the `cfg` attributes that gate it.
#[derive(Debug, Clone)]
struct ModuleReach {
    visibility: TypeVisibility,
    cfgs: Vec<Attribute>,
}

/// A candidate confirmed to carry the marker.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub ident: Ident,
    pub module: ModulePath,
    pub visibility: Option<TypeVisibility>,
    pub extraction: Extraction,
    /// `cfg` attributes of the struct and of every module above it,
    /// outermost first.
    pub cfgs: Vec<Attribute>,
    /// The declaring module's `use` items, valid from any module.
    pub imports: Vec<ItemUse>,
}

impl ResolvedType {
    /// `crate::a::Name`
    pub fn qualified_name(&self) -> String {
        self.module.qualify(&self.ident.to_string())
    }
}

/// Resolved marker symbol.
#[derive(Debug, Clone)]
struct MarkerSymbol {
    simple_name: String,
    accepted: [String; 2],
}

pub struct MarkerResolver<'m, 'a> {
    model: &'m SemanticModel<'a>,
    matching: MarkerMatch,
    marker: Option<MarkerSymbol>,
}

impl<'m, 'a> MarkerResolver<'m, 'a> {
    /// Looks the marker up in `model`. Without the synthesized marker tree no
    /// candidate will ever match.
    pub fn new(model: &'m SemanticModel<'a>, matching: MarkerMatch) -> Self {
        let marker = model.lookup_trait(&marker::qualified_name()).map(|declaration| MarkerSymbol {
            simple_name: declaration.ident.to_string(),
            accepted: marker::accepted_paths(),
        });
        if marker.is_none() {
            log::debug!("marker {} is not declared; nothing will resolve", marker::qualified_name());
        }

        Self {
            model,
            matching,
            marker,
        }
    }

    /// Resolve every candidate of `collector`, keeping collection order.
    pub fn resolve_all(&self, collector: &DeclarationCollector<'_>) -> Vec<ResolvedType> {
        collector
            .candidates()
            .iter()
            .filter_map(|candidate| self.resolve(candidate, collector.scope(candidate.scope)))
            .collect()
    }

    pub fn resolve(&self, candidate: &CandidateDeclaration<'_>, scope: &Scope<'_>) -> Option<ResolvedType> {
        if !self.carries_marker(candidate.item, scope) {
            return None;
        }

        let qualified = scope.module.qualify(&candidate.item.ident.to_string());
        let declaration = self.model.lookup_struct(&qualified);
        let reach = self.reach(&scope.module);
        let extraction = match &reach {
            Some(_) => extract(declaration),
            None => Extraction::Unavailable(UnavailableReason::Private),
        };
        if let Extraction::Unavailable(reason) = &extraction {
            log::debug!("{qualified}: members unavailable ({reason:?})");
        }

        let (visibility, mut cfgs) = match reach {
            Some(reach) => (
                declaration
                    .and_then(|item| type_visibility(&item.vis))
                    .map(|vis| vis.narrowest(reach.visibility)),
                reach.cfgs,
            ),
            None => (None, Vec::new()),
        };
        cfgs.extend(cfg_attrs(&candidate.item.attrs));

        Some(ResolvedType {
            ident: candidate.item.ident.clone(),
            module: scope.module.clone(),
            visibility,
            extraction,
            cfgs,
            imports: scope.rebased_uses(self.model),
        })
    }

    /// Walks the `mod` items from `module` up to the crate root. `None` when a
    /// module below the root's children is hidden from the root, so generated
    /// code cannot name anything inside. Children of the root are visible to
    /// every module of the crate whatever their visibility. Modules whose
    /// declaration is not in the model are taken as public.
    fn reach(&self, module: &ModulePath) -> Option<ModuleReach> {
        let mut reach = ModuleReach {
            visibility: TypeVisibility::Public,
            cfgs: Vec::new(),
        };

        let mut current = module.clone();
        while let Some(parent) = current.parent() {
            if let Some(declaration) = self.model.lookup_module(&current) {
                let visibility = match &declaration.vis {
                    vis if parent.is_root() => type_visibility(vis).or(Some(TypeVisibility::Crate)),
                    Visibility::Restricted(restricted)
                        if restricted.path.is_ident("super") && parent.segments().len() == 1 =>
                    {
                        Some(TypeVisibility::Crate)
                    }
                    vis => type_visibility(vis),
                };
                reach.visibility = reach.visibility.narrowest(visibility?);

                let mut cfgs: Vec<Attribute> = cfg_attrs(&declaration.attrs).collect();
                cfgs.append(&mut reach.cfgs);
                reach.cfgs = cfgs;
            }
            current = parent;
        }
        Some(reach)
    }

    fn carries_marker(&self, item: &ItemStruct, scope: &Scope<'_>) -> bool {
        let Some(marker) = &self.marker else {
            return false;
        };

        derive_paths(item).iter().any(|path| match self.matching {
            MarkerMatch::SimpleName => path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == marker.simple_name),
            MarkerMatch::Qualified => scope
                .resolve(path, self.model)
                .iter()
                .any(|candidate| marker.accepted.contains(candidate)),
        })
    }
}

/// Every path listed in the struct's `#[derive(...)]` attributes.
fn derive_paths(item: &ItemStruct) -> Vec<syn::Path> {
    item.attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .collect()
}

fn type_visibility(vis: &Visibility) -> Option<TypeVisibility> {
    match vis {
        Visibility::Public(_) => Some(TypeVisibility::Public),
        Visibility::Restricted(restricted) if restricted.path.is_ident("crate") => Some(TypeVisibility::Crate),
        _ => None,
    }
}

fn cfg_attrs(attrs: &[Attribute]) -> impl Iterator<Item = Attribute> + '_ {
    attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned()
}

/// Members of `declaration` that a builder may set.
pub fn extract(declaration: Option<&ItemStruct>) -> Extraction {
    let Some(item) = declaration else {
        return Extraction::Unavailable(UnavailableReason::NotFound);
    };
    if !item.generics.params.is_empty() {
        return Extraction::Unavailable(UnavailableReason::Generic);
    }
    if type_visibility(&item.vis).is_none() {
        return Extraction::Unavailable(UnavailableReason::Private);
    }

    let named = match &item.fields {
        Fields::Named(named) => named,
        Fields::Unit => return Extraction::Members(MemberList::default()),
        Fields::Unnamed(_) => return Extraction::Unavailable(UnavailableReason::TupleFields),
    };

    let mut list = MemberList::default();
    for field in &named.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        if matches!(field.vis, Visibility::Public(_)) {
            list.members.push(ExtractedMember {
                ident: ident.clone(),
                ty: field.ty.clone(),
                index: list.members.len(),
            });
        } else {
            list.hidden_fields += 1;
        }
    }
    Extraction::Members(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{SourceForest, SourceTree, TreeOrigin};
    use crate::host::SyntaxReceiver;
    use syn::visit::Visit;

    fn forest(trees: &[(&[&str], &str)]) -> SourceForest {
        SourceForest::from_trees(trees.iter().map(|(module, text)| {
            SourceTree::parse(
                module.iter().copied().collect(),
                TreeOrigin::Synthesized("test".into()),
                text,
            )
            .unwrap()
        }))
    }

    fn marker_tree() -> SourceTree {
        SourceTree::parse(
            ModulePath::root(),
            TreeOrigin::Synthesized("marker".into()),
            &marker::marker_source().unwrap(),
        )
        .unwrap()
    }

    fn resolve(forest: &SourceForest, matching: MarkerMatch, with_marker: bool) -> Vec<ResolvedType> {
        let mut collector = DeclarationCollector::new();
        for tree in forest.trees() {
            collector.enter_tree(tree);
            collector.visit_file(&tree.file);
        }

        let mut model = SemanticModel::new(forest);
        if with_marker {
            model = model.with_source(marker_tree());
        }
        MarkerResolver::new(&model, matching).resolve_all(&collector)
    }

    fn names(resolved: &[ResolvedType]) -> Vec<String> {
        resolved.iter().map(ResolvedType::qualified_name).collect()
    }

    fn members(resolved: &ResolvedType) -> Vec<String> {
        match &resolved.extraction {
            Extraction::Members(list) => list.members.iter().map(|m| m.ident.to_string()).collect(),
            Extraction::Unavailable(reason) => panic!("unavailable: {reason:?}"),
        }
    }

    const PEOPLE: &str = r#"
        use crate::simple_builder_gen::GenerateBuilder;

        #[derive(Debug, Clone, GenerateBuilder)]
        pub struct Person {
            pub name: String,
            secret: String,
            pub age: u32,
        }

        #[derive(Debug, Clone)]
        pub struct Unmarked {
            pub name: String,
        }
    "#;

    #[test]
    fn resolves_marked_structs_and_extracts_pub_fields_in_order() {
        let forest = forest(&[(&["people"], PEOPLE)]);
        let resolved = resolve(&forest, MarkerMatch::Qualified, true);

        assert_eq!(names(&resolved), vec!["crate::people::Person"]);
        assert_eq!(members(&resolved[0]), vec!["name", "age"]);
        assert_eq!(resolved[0].visibility, Some(TypeVisibility::Public));

        let Extraction::Members(list) = &resolved[0].extraction else {
            unreachable!()
        };
        assert_eq!(list.hidden_fields, 1);
        assert_eq!(list.members[1].index, 1);
    }

    #[test]
    fn nothing_resolves_without_the_marker_declaration() {
        let forest = forest(&[(&["people"], PEOPLE)]);
        assert!(resolve(&forest, MarkerMatch::Qualified, false).is_empty());
        assert!(resolve(&forest, MarkerMatch::SimpleName, false).is_empty());
    }

    #[test]
    fn accepts_every_spelling_that_reaches_the_marker() {
        let forest = forest(&[
            (
                &[],
                r#"
                    use simple_builder_gen::GenerateBuilder;
                    #[derive(GenerateBuilder)]
                    pub struct AtRoot { pub a: u8 }
                "#,
            ),
            (
                &["direct"],
                r#"
                    #[derive(crate::simple_builder_gen::GenerateBuilder)]
                    pub struct FullPath { pub a: u8 }

                    #[derive(::simplebuilder_macros::GenerateBuilder)]
                    pub struct MacroCrate { pub a: u8 }
                "#,
            ),
            (
                &["imports"],
                r#"
                    use simplebuilder_macros::GenerateBuilder as Builder;
                    use crate::simple_builder_gen::*;

                    #[derive(Builder)]
                    pub struct Renamed { pub a: u8 }

                    #[derive(GenerateBuilder)]
                    pub struct Globbed { pub a: u8 }
                "#,
            ),
        ]);

        assert_eq!(
            names(&resolve(&forest, MarkerMatch::Qualified, true)),
            vec![
                "crate::AtRoot",
                "crate::direct::FullPath",
                "crate::direct::MacroCrate",
                "crate::imports::Renamed",
                "crate::imports::Globbed",
            ]
        );
    }

    #[test]
    fn qualified_matching_rejects_unrelated_markers_with_the_same_name() {
        let forest = forest(&[(
            &["elsewhere"],
            r#"
                use other_crate::GenerateBuilder;

                #[derive(GenerateBuilder)]
                pub struct Impostor { pub a: u8 }
            "#,
        )]);

        assert!(resolve(&forest, MarkerMatch::Qualified, true).is_empty());
        assert_eq!(
            names(&resolve(&forest, MarkerMatch::SimpleName, true)),
            vec!["crate::elsewhere::Impostor"]
        );
    }

    #[test]
    fn reports_unavailable_member_lists() {
        let forest = forest(&[(
            &["shapes"],
            r#"
                use crate::simple_builder_gen::GenerateBuilder;

                #[derive(GenerateBuilder)]
                pub struct Pair(pub u32, pub u32);

                #[derive(GenerateBuilder)]
                pub struct Wrapper<T> { pub inner: T }

                #[derive(GenerateBuilder)]
                struct Hidden { pub a: u8 }

                #[derive(GenerateBuilder)]
                pub(crate) struct Internal { pub a: u8 }

                #[derive(GenerateBuilder)]
                pub struct Unit;
            "#,
        )]);

        let resolved = resolve(&forest, MarkerMatch::Qualified, true);
        let reasons: Vec<Option<UnavailableReason>> = resolved
            .iter()
            .map(|r| match r.extraction {
                Extraction::Unavailable(reason) => Some(reason),
                Extraction::Members(_) => None,
            })
            .collect();

        assert_eq!(
            reasons,
            vec![
                Some(UnavailableReason::TupleFields),
                Some(UnavailableReason::Generic),
                Some(UnavailableReason::Private),
                None,
                None,
            ]
        );
        assert_eq!(resolved[3].visibility, Some(TypeVisibility::Crate));
        assert!(members(&resolved[4]).is_empty());
    }

    #[test]
    fn module_privacy_narrows_or_hides_builders() {
        let forest = forest(&[
            (
                &[],
                r#"
                    pub mod catalog;
                    pub(crate) mod staff;
                    mod internal {
                        #[derive(crate::simple_builder_gen::GenerateBuilder)]
                        pub struct Secret { pub code: u8 }
                    }
                "#,
            ),
            (
                &["catalog"],
                r#"
                    mod vault {
                        #[derive(crate::simple_builder_gen::GenerateBuilder)]
                        pub struct Locked { pub code: u8 }
                    }

                    #[derive(crate::simple_builder_gen::GenerateBuilder)]
                    pub struct Listing { pub title: String }
                "#,
            ),
            (
                &["staff"],
                r#"
                    #[derive(crate::simple_builder_gen::GenerateBuilder)]
                    pub struct Employee { pub name: String }
                "#,
            ),
        ]);

        let resolved = resolve(&forest, MarkerMatch::Qualified, true);
        let summary: Vec<(String, Option<TypeVisibility>, bool)> = resolved
            .iter()
            .map(|r| {
                let private = matches!(r.extraction, Extraction::Unavailable(UnavailableReason::Private));
                (r.qualified_name(), r.visibility, private)
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("crate::internal::Secret".to_string(), Some(TypeVisibility::Crate), false),
                ("crate::catalog::vault::Locked".to_string(), None, true),
                ("crate::catalog::Listing".to_string(), Some(TypeVisibility::Public), false),
                ("crate::staff::Employee".to_string(), Some(TypeVisibility::Crate), false),
            ]
        );
    }

    #[test]
    fn collects_cfg_gates_from_modules_and_the_struct() {
        let forest = forest(&[
            (&[], r#"#[cfg(feature = "extras")] pub mod extras;"#),
            (
                &["extras"],
                r#"
                    #[cfg(unix)]
                    pub mod unix {
                        #[cfg(not(test))]
                        #[derive(crate::simple_builder_gen::GenerateBuilder)]
                        pub struct Socket { pub path: String }
                    }
                "#,
            ),
        ]);

        let resolved = resolve(&forest, MarkerMatch::Qualified, true);
        let cfgs: Vec<String> = resolved[0]
            .cfgs
            .iter()
            .map(|attr| quote::quote!(#attr).to_string().replace(' ', ""))
            .collect();
        assert_eq!(
            cfgs,
            vec!["#[cfg(feature=\"extras\")]", "#[cfg(unix)]", "#[cfg(not(test))]"]
        );
    }

    #[test]
    fn missing_declarations_are_not_found() {
        assert!(matches!(
            extract(None),
            Extraction::Unavailable(UnavailableReason::NotFound)
        ));
    }

    #[test]
    fn carries_rebased_imports_of_the_declaring_scope() {
        let forest = forest(&[(
            &["shop"],
            r#"
                use std::collections::HashMap;
                use super::Address;
                use crate::simple_builder_gen::GenerateBuilder;

                #[derive(GenerateBuilder)]
                pub struct Order { pub lines: HashMap<String, u32>, pub ship_to: Address }
            "#,
        )]);

        let resolved = resolve(&forest, MarkerMatch::Qualified, true);
        let imports: Vec<String> = resolved[0]
            .imports
            .iter()
            .map(|item| quote::quote!(#item).to_string().replace(' ', ""))
            .collect();
        assert_eq!(
            imports,
            vec![
                "use::std::collections::HashMap;",
                "usecrate::Address;",
                "usecrate::simple_builder_gen::GenerateBuilder;",
            ]
        );
    }
}
