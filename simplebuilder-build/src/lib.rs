//! Build-time generator for fluent builder types.
//!
//! This crate scans your source files for `#[derive(GenerateBuilder)]` structs
//! and generates a `<Name>Builder` for each, with one `with_<field>` setter per
//! `pub` field and a terminal `build()`.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     simplebuilder_build::generate_builders()
//!         .scan_path("src/")
//!         .run()
//!         .expect("Failed to generate builders");
//! }
//! ```
//!
//! And at the root of your crate:
//!
//! ```ignore
//! include!(concat!(env!("OUT_DIR"), "/builder_source_gen_attribute.rs"));
//! include!(concat!(env!("OUT_DIR"), "/builder_source_gen_generated.rs"));
//! ```
//!
//! Structs opt in with `#[derive(GenerateBuilder)]`, imported from
//! `crate::simple_builder_gen`. Builders are re-exported from
//! `crate::simple_builder_gen_generated`.

pub mod collector;
pub mod config;
pub mod emitter;
pub mod error;
pub mod forest;
pub mod host;
pub mod marker;
pub mod pass;
pub mod resolver;
pub mod scope;

mod generator;

pub use config::{GeneratorConfig, MarkerMatch, UnavailablePolicy};
pub use error::GenerateError;
pub use generator::{BuilderGenerator, GenerationReport};
pub use host::{EmittedUnit, ExecutionContext, SourceGenerator, SyntaxReceiver, run_pass};
pub use pass::BuilderSourceGen;

/// Create a new builder generator with default settings.
///
/// # Example
///
/// ```ignore
/// simplebuilder_build::generate_builders()
///     .scan_path("src/")
///     .run()
///     .expect("Failed to generate builders");
/// ```
pub fn generate_builders() -> BuilderGenerator {
    BuilderGenerator::new()
}
