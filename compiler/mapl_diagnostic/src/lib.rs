//! Diagnostic system for transpilation issues.
//!
//! Every issue found while building IR (undeclared variables, variable/field
//! clashes, calls with too many arguments) becomes a [`Diagnostic`]:
//! - an [`ErrorCode`] for searchability
//! - a message saying what went wrong
//! - a primary label carrying the line/column span
//! - optional secondary labels and notes
//!
//! Diagnostics are collected by a [`DiagnosticQueue`] and reported as one
//! sorted batch once the whole unit has been processed.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{
    blank_variable_name, too_many_arguments, undeclared_variable, var_field_conflict, Diagnostic,
    Label, Severity,
};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
