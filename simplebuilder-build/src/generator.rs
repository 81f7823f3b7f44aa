//! Build-script entry point.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{GeneratorConfig, MARKER_MATCH_ENV, ON_UNAVAILABLE_ENV};
use crate::error::GenerateError;
use crate::forest::SourceForest;
use crate::host::run_pass;
use crate::pass::BuilderSourceGen;

/// What a [`BuilderGenerator::run`] did on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Units whose contents changed and were rewritten.
    pub written: Vec<PathBuf>,
    /// Units already up to date.
    pub unchanged: Vec<PathBuf>,
}

/// Builder for configuring and running the generator from `build.rs`.
pub struct BuilderGenerator {
    scan_paths: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    config: Option<GeneratorConfig>,
    emit_rerun_directives: bool,
}

impl BuilderGenerator {
    /// Create a new generator with default settings.
    pub fn new() -> Self {
        Self {
            scan_paths: Vec::new(),
            out_dir: None,
            config: None,
            emit_rerun_directives: true,
        }
    }

    /// Add a path to scan for marked structs.
    ///
    /// Can be called multiple times. Relative paths are resolved against
    /// `CARGO_MANIFEST_DIR` when it is set.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Set the directory the units are written to.
    ///
    /// Default: `OUT_DIR`
    pub fn out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(path.into());
        self
    }

    /// Use `config` instead of [`GeneratorConfig::from_env`].
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Whether to print `cargo:rerun-if-*` directives.
    ///
    /// Default: `true`
    pub fn emit_rerun_directives(mut self, emit: bool) -> Self {
        self.emit_rerun_directives = emit;
        self
    }

    /// Run the generator.
    ///
    /// This scans all configured paths, runs one generation pass, and writes
    /// both units to the output directory.
    pub fn run(self) -> Result<GenerationReport> {
        let config = match self.config {
            Some(config) => config,
            None => GeneratorConfig::from_env().context("Failed to read generator configuration")?,
        };

        let out_dir = match self.out_dir {
            Some(dir) => dir,
            None => std::env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(GenerateError::MissingEnv("OUT_DIR"))?,
        };

        // Default to scanning "src/" if no paths specified
        let scan_paths = if self.scan_paths.is_empty() {
            vec![PathBuf::from("src/")]
        } else {
            self.scan_paths
        };
        let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from);
        let scan_paths: Vec<PathBuf> = scan_paths
            .into_iter()
            .map(|path| match &manifest_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            })
            .collect();

        let mut forest = SourceForest::new();
        for path in &scan_paths {
            let loaded = SourceForest::load(path).with_context(|| format!("Failed to scan {}", path.display()))?;
            forest.extend(loaded);
        }

        let generator = BuilderSourceGen::new(config);
        let units = run_pass(&generator, &forest).context("Builder generation failed")?;

        fs::create_dir_all(&out_dir).with_context(|| format!("Failed to create directory {}", out_dir.display()))?;

        let mut report = GenerationReport::default();
        for unit in &units {
            let path = out_dir.join(&unit.name);
            if write_if_changed(&path, &unit.text)? {
                log::info!("generated {}", path.display());
                report.written.push(path);
            } else {
                report.unchanged.push(path);
            }
        }

        if self.emit_rerun_directives {
            for path in &scan_paths {
                println!("cargo:rerun-if-changed={}", path.display());
            }
            println!("cargo:rerun-if-env-changed={MARKER_MATCH_ENV}");
            println!("cargo:rerun-if-env-changed={ON_UNAVAILABLE_ENV}");
        }

        Ok(report)
    }
}

impl Default for BuilderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Only write if content has changed (avoids unnecessary recompilation).
fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    let should_write = match fs::read_to_string(path) {
        Ok(existing) => existing != contents,
        Err(_) => true,
    };

    if should_write {
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(should_write)
}
