//! Rendering of builder types.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::visit_mut::{self, VisitMut};
use syn::{Ident, Type, TypePath, UseTree};

use crate::config::UnavailablePolicy;
use crate::error::GenerateError;
use crate::marker::{self, GENERATED_MODULE};
use crate::resolver::{Extraction, ExtractedMember, MemberList, ResolvedType, TypeVisibility, UnavailableReason};

/// Renders the builders unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderEmitter {
    policy: UnavailablePolicy,
}

impl BuilderEmitter {
    pub fn new(policy: UnavailablePolicy) -> Self {
        Self { policy }
    }

    /// Source text of the unit holding a builder for each of `resolved`.
    pub fn emit(&self, resolved: &[ResolvedType]) -> Result<String, GenerateError> {
        let mut seen = HashSet::new();
        let mut builders = Vec::new();

        for ty in resolved {
            let builder = builder_name(&ty.ident);
            if !seen.insert(builder.to_string()) {
                log::warn!(
                    "skipping {}: another marked struct already produced `{builder}`",
                    ty.qualified_name()
                );
                continue;
            }
            if let Some(tokens) = self.render_type(ty) {
                builders.push(tokens);
            }
        }

        let namespace = format_ident!("{}", GENERATED_MODULE);
        marker::render(quote! {
            /// Builders generated for `#[derive(GenerateBuilder)]` structs.
            #[allow(non_snake_case, dead_code, unused_imports, clippy::all)]
            pub mod #namespace {
                #(#builders)*
            }
        })
    }

    fn render_type(&self, ty: &ResolvedType) -> Option<TokenStream> {
        let empty = MemberList::default();
        let (members, build) = match &ty.extraction {
            Extraction::Members(list) => (list, BuildStyle::of(list)),
            Extraction::Unavailable(UnavailableReason::Generic | UnavailableReason::Private) => return None,
            Extraction::Unavailable(_) => match self.policy {
                UnavailablePolicy::Skip => return None,
                UnavailablePolicy::EmitEmpty => (&empty, BuildStyle::Default),
            },
        };
        let visibility = ty.visibility?;

        let target: syn::Path = syn::parse_str(&ty.qualified_name()).ok()?;
        let builder = builder_name(&ty.ident);
        let module = format_ident!("__{}_builder", to_snake_case(&ty.ident.unraw().to_string()));
        let vis = match visibility {
            TypeVisibility::Public => quote!(pub),
            TypeVisibility::Crate => quote!(pub(crate)),
        };
        let declaring: syn::Path = syn::parse_str(&ty.module.to_string()).ok()?;
        let imports = ty.imports.iter().filter(|item| !mentions(&item.tree, GENERATED_MODULE));
        let marker_trait = marker::trait_path();
        let cfgs = &ty.cfgs;

        let fields: Vec<MemberTokens> = members
            .members
            .iter()
            .map(|member| MemberTokens::new(member, &target))
            .collect();

        let backing_fields = fields.iter().map(|field| {
            let backing = &field.backing;
            let ty = &field.ty;
            quote!(#backing: #ty)
        });

        let setters = fields.iter().map(|field| {
            let MemberTokens {
                member,
                backing,
                setter,
                ty,
                ..
            } = field;
            let doc = format!("Set `{}`.", member.unraw());
            quote! {
                #[doc = #doc]
                pub fn #setter(mut self, value: #ty) -> Self {
                    self.#backing = value;
                    self
                }
            }
        });

        let body = match build {
            BuildStyle::Literal => {
                let assignments = fields.iter().map(|field| {
                    let MemberTokens { member, backing, .. } = field;
                    quote!(#member: self.#backing)
                });
                quote! {
                    #target {
                        #(#assignments,)*
                    }
                }
            }
            BuildStyle::Assign => {
                let assignments = fields.iter().map(|field| {
                    let MemberTokens { member, backing, .. } = field;
                    quote!(value.#member = self.#backing;)
                });
                quote! {
                    let mut value: #target = ::core::default::Default::default();
                    #(#assignments)*
                    value
                }
            }
            BuildStyle::Default => quote!(::core::default::Default::default()),
        };

        let doc = format!("Fluent builder for `{}`.", ty.qualified_name());

        Some(quote! {
            #(#cfgs)*
            #vis use self::#module::#builder;

            #(#cfgs)*
            mod #module {
                use #declaring::*;
                #(#imports)*

                #[doc = #doc]
                #[derive(Default)]
                #vis struct #builder {
                    #(#backing_fields,)*
                }

                impl #builder {
                    #(#setters)*

                    /// Construct the value from the fields set so far.
                    pub fn build(self) -> #target {
                        #body
                    }
                }

                impl #marker_trait for #target {
                    type Builder = #builder;
                }
            }
        })
    }
}

/// How `build` constructs the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStyle {
    /// `Target { a: self._a, .. }`, naming every field.
    Literal,
    /// Start from `Default::default()` and assign the public fields.
    Assign,
    /// `Default::default()` outright.
    Default,
}

impl BuildStyle {
    fn of(list: &MemberList) -> Self {
        if list.hidden_fields == 0 {
            BuildStyle::Literal
        } else if list.members.is_empty() {
            BuildStyle::Default
        } else {
            BuildStyle::Assign
        }
    }
}

struct MemberTokens<'a> {
    member: &'a Ident,
    backing: Ident,
    setter: Ident,
    ty: Type,
}

impl<'a> MemberTokens<'a> {
    fn new(member: &'a ExtractedMember, target: &syn::Path) -> Self {
        let mut ty = member.ty.clone();
        ReplaceSelf { target }.visit_type_mut(&mut ty);
        Self {
            member: &member.ident,
            backing: backing_field_name(&member.ident),
            setter: setter_name(&member.ident),
            ty,
        }
    }
}

/// Rewrites `Self` to the target's absolute path; inside the builder it
/// would name the builder.
struct ReplaceSelf<'a> {
    target: &'a syn::Path,
}

impl VisitMut for ReplaceSelf<'_> {
    fn visit_type_path_mut(&mut self, node: &mut TypePath) {
        if node.qself.is_none() && node.path.is_ident("Self") {
            node.path = self.target.clone();
            return;
        }
        visit_mut::visit_type_path_mut(self, node);
    }
}

/// Whether any segment of `tree` is `name`. Imports of generated builders
/// would clash with the builder definitions themselves.
fn mentions(tree: &UseTree, name: &str) -> bool {
    match tree {
        UseTree::Path(path) => path.ident == name || mentions(&path.tree, name),
        UseTree::Name(use_name) => use_name.ident == name,
        UseTree::Rename(rename) => rename.ident == name,
        UseTree::Glob(_) => false,
        UseTree::Group(group) => group.items.iter().any(|item| mentions(item, name)),
    }
}

/// `Person` -> `PersonBuilder`
pub fn builder_name(ident: &Ident) -> Ident {
    format_ident!("{}Builder", ident.unraw())
}

/// `age` -> `_age`, `Age` -> `_age`, `r#type` -> `_type`
pub fn backing_field_name(member: &Ident) -> Ident {
    format_ident!("_{}", lower_first(&member.unraw().to_string()))
}

/// `age` -> `with_age`
pub fn setter_name(member: &Ident) -> Ident {
    format_ident!("with_{}", lower_first(&member.unraw().to_string()))
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert PascalCase to snake_case.
fn to_snake_case(name: &str) -> String {
    let mut result = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
