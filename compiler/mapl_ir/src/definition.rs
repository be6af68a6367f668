use std::fmt;

use crate::{Span, ValueSource};

/// Where a function definition came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionKind {
    /// A `def` in source.
    Declared,
    /// The top-level statements of a program.
    Root,
    /// A lifted `{ ... }` block.
    Block,
    /// A lifted inline callback.
    Lambda,
}

/// One step of a write path.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum PathSegment {
    Field(String),
    Index(u32),
    /// `[]`: append to the array at this position.
    Append,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "[{index}]"),
            PathSegment::Append => f.write_str("[]"),
        }
    }
}

/// Destination of a mapping's value.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// Bare expression statement: merged into the frame's output.
    #[default]
    Output,
    /// Write to a variable (optionally into a nested path of it).
    Var { name: String, path: Vec<PathSegment> },
    /// Write to a field of the frame's output.
    Field { path: Vec<PathSegment> },
}

impl Target {
    /// First field name the target writes, used to detect var/field clashes.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Target::Output => None,
            Target::Var { name, .. } => Some(name),
            Target::Field { path } => match path.first() {
                Some(PathSegment::Field(name)) => Some(name),
                _ => None,
            },
        }
    }
}

/// A single statement of a function body.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldMapping {
    pub value: ValueSource,
    pub target: Target,
    /// Write each element of the value to the target separately.
    pub iterate_source: bool,
    pub span: Span,
}

impl FieldMapping {
    /// Mapping that merges a value into the output.
    pub fn output(value: ValueSource) -> Self {
        let span = value.span;
        FieldMapping {
            value,
            target: Target::Output,
            iterate_source: false,
            span,
        }
    }
}

/// A named function with ordered parameters and a mapping body.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDefinition {
    pub name: String,
    /// Declared parameters followed by names captured from enclosing scopes.
    pub params: Vec<String>,
    /// Variable reads and writes fall through to the caller's frame.
    pub inherit_parent_vars: bool,
    pub mappings: Vec<FieldMapping>,
    pub kind: DefinitionKind,
    pub span: Span,
}
