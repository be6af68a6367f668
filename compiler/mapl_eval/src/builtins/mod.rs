//! Core builtins, registered in the `builtins` package.
//!
//! These are the functions the transpiler lowers syntax into: `iterate` for
//! `expr[]` broadcasting, `ternary`/`and`/`or` for control flow over
//! deferred closures, `get` for path reads, and the operators. The array
//! selectors (`where`, `sortBy`, `groupBy`, `join`, ...) take the callbacks
//! the transpiler lifts out of `items[selector predicate]`.

mod arithmetic;
mod collections;
mod iteration;
mod logic;
mod selectors;

use std::sync::Arc;

use mapl_ir::BUILTINS_PACKAGE;

use crate::closure::Closure;
use crate::errors::{invalid_argument, EvalResult};
use crate::function::{ArgType, NativeFn, NativeFunction, Signature};
use crate::registry::FunctionRegistry;
use crate::value::{Capability, Kind, Value};

pub(crate) use iteration::iterate_values;

const CLOSURE: ArgType = ArgType::Exact(Kind::Closure);
const NULL: ArgType = ArgType::Exact(Kind::Null);
const PRIMITIVE: ArgType = ArgType::Capability(Capability::Primitive);
const ARRAY: ArgType = ArgType::Capability(Capability::Array);
const CONTAINER: ArgType = ArgType::Capability(Capability::Container);

/// Register every builtin overload.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    iteration::register(registry);
    logic::register(registry);
    arithmetic::register(registry);
    collections::register(registry);
    selectors::register(registry);
}

fn native(registry: &mut FunctionRegistry, name: &str, args: Vec<ArgType>, func: NativeFn) {
    registry.register(Arc::new(NativeFunction::new(
        Signature::new(BUILTINS_PACKAGE, name, args),
        func,
    )));
}

fn native_variadic(
    registry: &mut FunctionRegistry,
    name: &str,
    args: Vec<ArgType>,
    func: NativeFn,
) {
    registry.register(Arc::new(NativeFunction::new(
        Signature::new(BUILTINS_PACKAGE, name, args).variadic(),
        func,
    )));
}

fn closure_arg<'a>(function: &str, value: &'a Value) -> EvalResult<&'a Closure> {
    value
        .as_closure()
        .ok_or_else(|| invalid_argument(function, format!("expected a closure, got {}", value.type_name())))
}

fn number_arg(function: &str, value: &Value) -> EvalResult<f64> {
    value
        .as_number()
        .ok_or_else(|| invalid_argument(function, format!("expected a number, got {}", value.type_name())))
}
