//! Mapl Eval - closure runtime for transpiled Mapl pipelines.
//!
//! Takes the [`PipelineConfig`](mapl_ir::PipelineConfig) produced by
//! `mapl_transpile` and runs it against input values.
//!
//! # Architecture
//!
//! - [`Runtime`]: shared function registry, package aliases, overload
//!   selector and cancellation token
//! - [`RuntimeContext`]: one per worker; frames of variables and the call
//!   stack used for backtraces
//! - [`Closure`]: function reference plus arguments, bound one free
//!   parameter at a time and executed through overload dispatch
//! - [`DistanceSelector`]: picks the overload with the unique minimum
//!   structural distance to the arguments
//! - [`IrFunction`]: a transpiled definition, executed mapping by mapping
//! - [`builtins`]: `iterate`, `where`, `reduce`, `ternary`, operators
//!
//! Datasets are mapped in parallel with rayon; every worker forks its own
//! context from the shared runtime.

pub mod builtins;
pub mod closure;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod function;
mod ir_function;
pub mod registry;
mod shared;
pub mod suggest;
mod tracing_setup;
pub mod value;

pub use closure::Closure;
pub use context::{CancellationToken, Runtime, RuntimeBuilder, RuntimeContext};
pub use dispatch::{distance, signature_distance, DistanceSelector, OverloadSelector};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use function::{ArgType, CallableFunction, NativeFunction, Signature};
pub use ir_function::IrFunction;
pub use registry::FunctionRegistry;
pub use shared::SharedMutableRegistry;
pub use tracing_setup::init_tracing;
pub use value::{Capability, Heap, Kind, Value};
