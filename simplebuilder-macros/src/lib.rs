use proc_macro::TokenStream;
use syn::{Data, DeriveInput, Error, parse_macro_input};

/// Opt a struct into builder generation.
///
/// The derive itself expands to nothing. It only makes the marker legal on the
/// struct; `simplebuilder-build` finds it from the crate's build script and
/// emits `<Name>Builder` into `crate::simple_builder_gen_generated`.
///
/// # Requirements
///
/// - Every `pub` field's type must implement `Default`; unset fields start
///   from it. A field such as `std::fs::File` fails in the generated unit.
/// - When the struct also has non-`pub` fields, the struct itself must
///   implement `Default`; `build()` assigns the set fields over it.
/// - Only structs the crate root can name get a builder. Structs in a
///   module that is private below the crate root's children, generic
///   structs and tuple structs are skipped.
///
/// ```text
/// use crate::simple_builder_gen::GenerateBuilder;
///
/// #[derive(Debug, GenerateBuilder)]
/// pub struct Person {
///     pub name: String,
///     pub age: u32,
/// }
///
/// let person = PersonBuilder::default().with_name("Ada".into()).with_age(36).build();
/// ```
#[proc_macro_derive(GenerateBuilder)]
pub fn derive_generate_builder(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match &input.data {
        Data::Struct(_) => TokenStream::new(),
        Data::Enum(_) | Data::Union(_) => Error::new(input.ident.span(), "GenerateBuilder can only be derived for structs")
            .to_compile_error()
            .into(),
    }
}
