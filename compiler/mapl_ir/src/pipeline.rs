use crate::FunctionDefinition;

/// A compiled program: its root function plus every other definition
/// (declared functions and lifted blocks/lambdas).
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    pub package: String,
    pub root: FunctionDefinition,
    pub functions: Vec<FunctionDefinition>,
}

impl PipelineConfig {
    /// Look up a non-root definition by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The root definition followed by all others.
    pub fn definitions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        std::iter::once(&self.root).chain(&self.functions)
    }
}
