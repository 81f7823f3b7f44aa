//! The builder generation pass.

use crate::collector::DeclarationCollector;
use crate::config::GeneratorConfig;
use crate::emitter::BuilderEmitter;
use crate::error::GenerateError;
use crate::forest::{ModulePath, SemanticModel, SourceTree, TreeOrigin};
use crate::host::{ExecutionContext, SourceGenerator};
use crate::marker;
use crate::resolver::MarkerResolver;

/// Generates a builder for every struct deriving `GenerateBuilder`.
///
/// Each pass registers two units: the marker declaration and the builders.
#[derive(Debug, Clone, Default)]
pub struct BuilderSourceGen {
    config: GeneratorConfig,
}

impl BuilderSourceGen {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl SourceGenerator for BuilderSourceGen {
    type Receiver<'ast> = DeclarationCollector<'ast>;

    fn initialize<'ast>(&self) -> DeclarationCollector<'ast> {
        DeclarationCollector::new()
    }

    fn execute<'ast>(
        &self,
        receiver: DeclarationCollector<'ast>,
        context: &mut ExecutionContext<'ast>,
    ) -> Result<(), GenerateError> {
        let forest = context.forest();
        for reserved in [marker::MARKER_MODULE, marker::GENERATED_MODULE] {
            if forest.declares_module(&ModulePath::root().child(reserved)) {
                return Err(GenerateError::ReservedNamespace(reserved.to_string()));
            }
        }

        let marker_source = marker::marker_source()?;
        let marker_tree = SourceTree::parse(
            ModulePath::root(),
            TreeOrigin::Synthesized(self.config.marker_unit.clone()),
            &marker_source,
        )?;
        let model = SemanticModel::new(forest).with_source(marker_tree);

        let resolved = MarkerResolver::new(&model, self.config.marker_match).resolve_all(&receiver);
        log::debug!(
            "{} of {} candidates carry the marker",
            resolved.len(),
            receiver.candidates().len()
        );

        let builders = BuilderEmitter::new(self.config.on_unavailable).emit(&resolved)?;

        context.add_source(self.config.marker_unit.clone(), marker_source);
        context.add_source(self.config.builders_unit.clone(), builders);
        Ok(())
    }
}
