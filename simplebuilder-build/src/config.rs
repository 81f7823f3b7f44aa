//! Generator configuration.

use std::str::FromStr;

use crate::error::GenerateError;

/// Environment variable overriding [`GeneratorConfig::marker_match`].
pub const MARKER_MATCH_ENV: &str = "SIMPLEBUILDER_MARKER_MATCH";

/// Environment variable overriding [`GeneratorConfig::on_unavailable`].
pub const ON_UNAVAILABLE_ENV: &str = "SIMPLEBUILDER_ON_UNAVAILABLE";

/// How a derive path is compared against the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerMatch {
    /// Any path whose last segment is the marker's name.
    SimpleName,
    /// The path must resolve, through the module's imports, to the marker's
    /// reserved location or to the derive in `simplebuilder_macros`.
    #[default]
    Qualified,
}

impl FromStr for MarkerMatch {
    type Err = GenerateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" | "simple-name" => Ok(Self::SimpleName),
            "qualified" => Ok(Self::Qualified),
            _ => Err(GenerateError::InvalidConfig {
                key: MARKER_MATCH_ENV,
                value: value.to_string(),
            }),
        }
    }
}

/// What to emit for a marked struct whose members cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnavailablePolicy {
    /// Emit nothing for it.
    #[default]
    Skip,
    /// Emit a builder without setters whose `build` returns `Default::default()`.
    EmitEmpty,
}

impl FromStr for UnavailablePolicy {
    type Err = GenerateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "emit-empty" | "emit_empty" => Ok(Self::EmitEmpty),
            _ => Err(GenerateError::InvalidConfig {
                key: ON_UNAVAILABLE_ENV,
                value: value.to_string(),
            }),
        }
    }
}

/// Settings for one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub marker_match: MarkerMatch,
    pub on_unavailable: UnavailablePolicy,
    /// File name of the unit holding the marker declaration.
    pub marker_unit: String,
    /// File name of the unit holding every generated builder.
    pub builders_unit: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            marker_match: MarkerMatch::default(),
            on_unavailable: UnavailablePolicy::default(),
            marker_unit: "builder_source_gen_attribute.rs".to_string(),
            builders_unit: "builder_source_gen_generated.rs".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Defaults, with the matching mode and unavailable policy taken from the
    /// environment when set.
    pub fn from_env() -> Result<Self, GenerateError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(MARKER_MATCH_ENV) {
            config.marker_match = value.parse()?;
        }
        if let Ok(value) = std::env::var(ON_UNAVAILABLE_ENV) {
            config.on_unavailable = value.parse()?;
        }
        Ok(config)
    }
}
