//! The marker and the reserved names generated code lives under.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::error::GenerateError;
use crate::forest::ModulePath;

/// Simple name of the marker derive and of the marker trait.
pub const MARKER_NAME: &str = "GenerateBuilder";

/// Module, at the crate root, holding the marker declaration.
pub const MARKER_MODULE: &str = "simple_builder_gen";

/// Module, at the crate root, every generated builder is re-exported from.
pub const GENERATED_MODULE: &str = "simple_builder_gen_generated";

/// Crate providing the marker derive.
pub const MACROS_CRATE: &str = "simplebuilder_macros";

/// Header prepended to every emitted unit.
pub const GENERATED_HEADER: &str = "// @generated by simplebuilder-build. Do not edit.\n\n";

pub fn marker_module() -> ModulePath {
    ModulePath::from_iter([MARKER_MODULE])
}

/// `crate::simple_builder_gen::GenerateBuilder`
pub fn qualified_name() -> String {
    marker_module().qualify(MARKER_NAME)
}

/// Absolute paths a derive may resolve to and still count as the marker.
pub fn accepted_paths() -> [String; 2] {
    [qualified_name(), format!("::{MACROS_CRATE}::{MARKER_NAME}")]
}

/// `crate::simple_builder_gen::GenerateBuilder` as tokens, for impl headers.
pub fn trait_path() -> TokenStream {
    let module = format_ident!("{}", MARKER_MODULE);
    let name = format_ident!("{}", MARKER_NAME);
    quote!(crate::#module::#name)
}

fn marker_tokens() -> TokenStream {
    let module = format_ident!("{}", MARKER_MODULE);
    let name = format_ident!("{}", MARKER_NAME);
    let macros = format_ident!("{}", MACROS_CRATE);

    quote! {
        /// Builder generation marker.
        ///
        /// `#[derive(GenerateBuilder)]` opts a struct in; the trait of the same
        /// name is implemented for it by the generated builders unit.
        pub mod #module {
            pub use ::#macros::#name;

            /// Implemented for every struct that has a generated builder.
            pub trait #name {
                type Builder: ::core::default::Default;

                /// A builder with every field at its default value.
                fn builder() -> Self::Builder {
                    ::core::default::Default::default()
                }
            }
        }
    }
}

/// Source text of the unit declaring the marker.
pub fn marker_source() -> Result<String, GenerateError> {
    render(marker_tokens())
}

/// Pretty-print a generated file and prepend the header.
pub(crate) fn render(tokens: TokenStream) -> Result<String, GenerateError> {
    let file: syn::File = syn::parse2(tokens).map_err(GenerateError::Render)?;
    Ok(format!("{GENERATED_HEADER}{}", prettyplease::unparse(&file)))
}
