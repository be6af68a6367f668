use std::fmt;

use crate::{Span, ValueSource, BUILTINS_PACKAGE, WILDCARD_PACKAGE};

/// Lookup key of a function: optional package plus name.
///
/// - `package == None`: search the caller's globally aliased packages.
/// - `package == Some("*")`: search every registered package.
/// - otherwise: search exactly that package.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionReference {
    pub package: Option<String>,
    pub name: String,
}

impl FunctionReference {
    /// Reference with no package (resolved through the caller's aliases).
    pub fn unqualified(name: impl Into<String>) -> Self {
        FunctionReference {
            package: None,
            name: name.into(),
        }
    }

    /// Reference into an explicit package.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        FunctionReference {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    /// Reference into the builtins package.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::qualified(BUILTINS_PACKAGE, name)
    }

    /// Reference searching every registered package.
    pub fn wildcard(name: impl Into<String>) -> Self {
        Self::qualified(WILDCARD_PACKAGE, name)
    }

    /// Whether the package is the `*` wildcard.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.package.as_deref() == Some(WILDCARD_PACKAGE)
    }
}

impl fmt::Display for FunctionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{package}::{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A call of a function with ordered arguments.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionCall {
    pub reference: FunctionReference,
    pub args: Vec<ValueSource>,
    /// Evaluate to a deferred closure instead of executing.
    pub build_closure: bool,
    pub span: Span,
}

impl FunctionCall {
    /// Create an immediately executed call.
    pub fn new(reference: FunctionReference, args: Vec<ValueSource>, span: Span) -> Self {
        FunctionCall {
            reference,
            args,
            build_closure: false,
            span,
        }
    }

    /// Turn this call into a closure constructor.
    #[must_use]
    pub fn into_closure(mut self) -> Self {
        self.build_closure = true;
        self
    }

    /// Number of free-parameter placeholders among the arguments.
    pub fn free_parameter_count(&self) -> usize {
        self.args.iter().filter(|a| a.is_free_parameter()).count()
    }
}
