//! Error types for scope resolution and transpilation.

use mapl_diagnostic::Diagnostic;

/// Misuse of the scope resolver.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("variable name must not be blank")]
    BlankName,
    #[error("cannot pop the root scope")]
    PopRoot,
    #[error("scope arena exceeds u32::MAX entries")]
    TooManyScopes,
}

/// Failure of a whole transpilation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TranspileError {
    /// Strict mode stops at the first issue.
    #[error("{0}")]
    Strict(Box<Diagnostic>),
    /// Tolerant mode reports every issue of the unit at once.
    #[error("{} issue(s) found while transpiling; first: {}", .0.len(), first_message(.0))]
    Issues(Vec<Diagnostic>),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

fn first_message(issues: &[Diagnostic]) -> &str {
    issues.first().map_or("", |d| d.message.as_str())
}

impl TranspileError {
    /// All diagnostics carried by this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TranspileError::Strict(diag) => std::slice::from_ref(diag.as_ref()),
            TranspileError::Issues(issues) => issues,
            TranspileError::Scope(_) => &[],
        }
    }
}

pub type TranspileResult<T> = Result<T, TranspileError>;
