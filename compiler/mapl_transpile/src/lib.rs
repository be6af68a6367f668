//! Compile-time half of the Mapl mapping language.
//!
//! Takes a syntax tree ([`syntax::Program`]) and produces Pipeline IR
//! ([`mapl_ir::PipelineConfig`]):
//!
//! - [`environment`] resolves variable references against the lexical
//!   scope chain and records which names each nested scope captures.
//! - The [`Transpiler`] lowers expressions to IR, lifts blocks and callbacks
//!   into standalone definitions, expands `$`/`$N` placeholders, and
//!   desugars `expr[]` broadcasting into `builtins::iterate`.
//! - [`signature`] describes how each argument of a known callee is lowered.
//! - [`conflicts`] and [`rescope`] are post-passes over finished IR.
//!
//! ```text
//! Program ──Transpiler──▶ PipelineConfig ──▶ runtime
//!              │
//!              └─ Environment (scopes, captures)
//! ```

pub mod conflicts;
pub mod environment;
pub mod errors;
pub mod names;
pub mod rescope;
pub mod signature;
pub mod syntax;
mod transpiler;

pub use environment::{Environment, Resolution, ScopeId};
pub use errors::{ScopeError, TranspileError, TranspileResult};
pub use names::{NameGenerator, SeededNames, SequentialNames};
pub use signature::{ArgSpec, ClosureSpec, LambdaKind, Signature, SignatureTable};
pub use transpiler::{CompileMode, TranspileConfig, TranspileOutput, Transpiler, GLOBAL_SCOPE};
