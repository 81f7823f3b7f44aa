//! The contract between a generation pass and the build that drives it.

use syn::visit::Visit;

use crate::error::GenerateError;
use crate::forest::{SourceForest, SourceTree};

/// A finished block of generated source, handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedUnit {
    /// File name the unit is written under, e.g. `builder_source_gen_generated.rs`.
    pub name: String,
    pub text: String,
}

/// Listener the host walks over every tree of the forest.
pub trait SyntaxReceiver<'ast>: Visit<'ast> {
    /// Called before the tree's file is visited.
    fn enter_tree(&mut self, tree: &'ast SourceTree);
}

/// State of one pass as seen from [`SourceGenerator::execute`].
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    forest: &'a SourceForest,
    units: Vec<EmittedUnit>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(forest: &'a SourceForest) -> Self {
        Self {
            forest,
            units: Vec::new(),
        }
    }

    pub fn forest(&self) -> &'a SourceForest {
        self.forest
    }

    /// Register a unit for inclusion in the build.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.units.push(EmittedUnit {
            name: name.into(),
            text: text.into(),
        });
    }

    pub fn units(&self) -> &[EmittedUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<EmittedUnit> {
        self.units
    }
}

/// A generator registered with the host.
///
/// `initialize` is called once per pass for a fresh receiver; the host walks
/// the forest with it and then hands it to `execute`.
pub trait SourceGenerator {
    type Receiver<'ast>: SyntaxReceiver<'ast>;

    fn initialize<'ast>(&self) -> Self::Receiver<'ast>;

    fn execute<'ast>(
        &self,
        receiver: Self::Receiver<'ast>,
        context: &mut ExecutionContext<'ast>,
    ) -> Result<(), GenerateError>;
}

/// Run one complete pass of `generator` over `forest`.
pub fn run_pass<G: SourceGenerator>(generator: &G, forest: &SourceForest) -> Result<Vec<EmittedUnit>, GenerateError> {
    let mut receiver = generator.initialize();
    for tree in forest.trees() {
        receiver.enter_tree(tree);
        receiver.visit_file(&tree.file);
    }

    let mut context = ExecutionContext::new(forest);
    generator.execute(receiver, &mut context)?;
    Ok(context.into_units())
}
