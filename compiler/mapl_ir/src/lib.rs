//! Pipeline IR for the Mapl mapping language.
//!
//! The IR is the contract between the compile-time transpiler and the
//! runtime: a flat list of [`FunctionDefinition`]s whose bodies are ordered
//! [`FieldMapping`]s, with every expression represented as a [`ValueSource`].
//!
//! # Architecture
//!
//! - Lexical scopes are gone by the time IR exists. Every variable a nested
//!   block or lambda reads from an enclosing scope has been threaded through
//!   the generated definition's parameter list (declared parameters first,
//!   captured names after).
//! - Calls that should produce a deferred closure instead of running carry
//!   `build_closure = true`. Unbound slots in such calls are
//!   [`SourceKind::FreeParameter`] placeholders.
//! - Per-argument `iterate` flags mark arguments to broadcast element-wise.
//!
//! All types are plain owned data, `Send + Sync`, and (with the `cache`
//! feature) serde-serializable so that debuggers and other tools can inspect
//! the same graph the runtime executes.

mod call;
mod definition;
mod pipeline;
mod source;
mod span;
pub mod visit;

pub use call::{FunctionCall, FunctionReference};
pub use definition::{DefinitionKind, FieldMapping, FunctionDefinition, PathSegment, Target};
pub use pipeline::PipelineConfig;
pub use source::{SourceKind, ValueSource};
pub use span::Span;

/// Name of the implicit output variable of every function frame.
pub const THIS_VAR: &str = "$this";

/// Parameter name of a pipeline's root function (the input record).
pub const ROOT_VAR: &str = "$root";

/// Package used when a program does not declare one.
pub const DEFAULT_PACKAGE: &str = "$default";

/// Package holding the core builtins the transpiler lowers syntax into.
pub const BUILTINS_PACKAGE: &str = "builtins";

/// Package wildcard: search every registered package.
pub const WILDCARD_PACKAGE: &str = "*";
