use std::path::PathBuf;

use thiserror::Error;

/// Host-level failures of a generation pass.
///
/// Problems with an individual declaration are never reported here; they are
/// logged and the declaration is skipped.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Reading a source file or writing an emitted unit failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source tree could not be parsed by `syn`.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: syn::Error,
    },

    /// A Cargo-provided environment variable is missing.
    #[error("environment variable `{0}` is not set; is this running from a build script?")]
    MissingEnv(&'static str),

    /// The user's sources already declare the module the marker unit occupies.
    #[error("module `{0}` is reserved for generated code")]
    ReservedNamespace(String),

    /// Generated tokens did not re-parse as a Rust file.
    #[error("generated code is not valid Rust: {0}")]
    Render(#[source] syn::Error),

    /// An environment override carried an unknown value.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
}
