//! Error types for closure execution and overload dispatch.
//!
//! `EvalErrorKind` is the structured category; factory functions
//! (e.g. [`no_free_parameters`]) are the public way to build an error.
//! Every dispatch error is fatal to the current call: nothing in this crate
//! retries or falls back, the host decides what to do with a failure.

use std::fmt;

use mapl_ir::Span;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Lookup
    #[error("no function named {reference}{}", format_suggestions(.suggestions))]
    NoMatchingFunction {
        reference: String,
        suggestions: Vec<String>,
    },
    #[error("no overload of {function} accepts ({})", .args.join(", "))]
    NoMatchingOverload { function: String, args: Vec<String> },
    #[error("ambiguous call to {function}, candidates: {}", .candidates.join(", "))]
    AmbiguousOverload {
        function: String,
        candidates: Vec<String>,
    },

    // Binding order
    #[error("closure {closure} has no free parameters left to bind")]
    NoFreeParameters { closure: String },
    #[error("closure {closure} executed with {remaining} unbound free parameter(s)")]
    UnboundFreeParameters { closure: String, remaining: usize },

    // Calls
    #[error(
        "{} arguments for {function}: expected {expected}, got {found}",
        if .found < .expected { "Not enough" } else { "Too many" }
    )]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("cannot write {segment} into {type_name}")]
    InvalidWrite { segment: String, type_name: String },

    #[error("execution cancelled")]
    Cancelled,
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean {}?", suggestions.join(", "))
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Qualified function name (`package::name`).
    pub name: String,
    pub span: Option<Span>,
}

impl BacktraceFrame {
    pub fn new(name: impl Into<String>) -> Self {
        BacktraceFrame {
            name: name.into(),
            span: None,
        }
    }
}

/// Snapshot of the call stack at an error site, innermost frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Source location of the IR node being evaluated, when known.
    pub span: Option<Span>,
    /// Call stack at the error site. Attached by the innermost
    /// `RuntimeContext::call` the error passes through.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            span: None,
            backtrace: None,
        }
    }

    /// Attach a source location unless one is already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Whether the error is a cooperative abort rather than a failure of
    /// the program being run.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.kind == EvalErrorKind::Cancelled
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Factory functions

#[cold]
pub fn no_matching_function(reference: impl fmt::Display, suggestions: Vec<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingFunction {
        reference: reference.to_string(),
        suggestions,
    })
}

#[cold]
pub fn no_matching_overload(function: impl fmt::Display, args: &[Value]) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingOverload {
        function: function.to_string(),
        args: args.iter().map(|a| a.type_name().to_string()).collect(),
    })
}

#[cold]
pub fn ambiguous_overload(function: impl fmt::Display, candidates: Vec<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AmbiguousOverload {
        function: function.to_string(),
        candidates,
    })
}

#[cold]
pub fn no_free_parameters(closure: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoFreeParameters {
        closure: closure.to_string(),
    })
}

#[cold]
pub fn unbound_free_parameters(closure: impl fmt::Display, remaining: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundFreeParameters {
        closure: closure.to_string(),
        remaining,
    })
}

#[cold]
pub fn arity_mismatch(function: impl fmt::Display, expected: usize, found: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        function: function.to_string(),
        expected,
        found,
    })
}

#[cold]
pub fn invalid_argument(function: &str, message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidArgument {
        function: function.to_string(),
        message: message.into(),
    })
}

#[cold]
pub fn invalid_write(segment: impl fmt::Display, target: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidWrite {
        segment: segment.to_string(),
        type_name: target.type_name().to_string(),
    })
}

#[cold]
pub fn cancelled() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Cancelled)
}
