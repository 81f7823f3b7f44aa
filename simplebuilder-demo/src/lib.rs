//! Models with builders generated at build time.
//!
//! `build.rs` scans this crate and writes two units to `OUT_DIR`; both are
//! pulled in here, at the crate root.

include!(concat!(env!("OUT_DIR"), "/builder_source_gen_attribute.rs"));
include!(concat!(env!("OUT_DIR"), "/builder_source_gen_generated.rs"));

pub mod inventory;
pub mod models;
