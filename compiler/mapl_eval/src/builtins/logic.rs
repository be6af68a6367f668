//! Conditionals, boolean operators and equality.
//!
//! `ternary`, `and` and `or` receive their branches and operands as
//! closures so that only what is needed gets evaluated.

use super::{closure_arg, native, native_variadic, CLOSURE};
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, EvalResult};
use crate::function::ArgType;
use crate::registry::FunctionRegistry;
use crate::value::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    native(registry, "ternary", vec![ArgType::Any, CLOSURE, CLOSURE], ternary);
    native(registry, "ternary", vec![ArgType::Any, CLOSURE], ternary);

    native_variadic(registry, "and", vec![CLOSURE], and);
    native_variadic(registry, "or", vec![CLOSURE], or);
    native(registry, "not", vec![ArgType::Any], not);
    native(registry, "isNotNil", vec![ArgType::Any], is_not_nil);

    native_variadic(
        registry,
        "eq",
        vec![ArgType::Any, ArgType::Any, ArgType::Any],
        eq,
    );
    native(registry, "neq", vec![ArgType::Any, ArgType::Any], neq);
}

/// `cond ? then : otherwise`; without `otherwise` a false condition is null.
fn ternary(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (cond, then, otherwise) = match args {
        [cond, then] => (cond, then, None),
        [cond, then, otherwise] => (cond, then, Some(otherwise)),
        _ => return Err(arity_mismatch("builtins::ternary", 3, args.len())),
    };
    let branch = if cond.is_truthy() { Some(then) } else { otherwise };
    match branch {
        Some(branch) => closure_arg("ternary", branch)?.execute(ctx),
        None => Ok(Value::Null),
    }
}

/// False without operands; stops at the first falsy operand.
fn and(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    if args.is_empty() {
        return Ok(Value::Bool(false));
    }
    for operand in args {
        if !closure_arg("and", operand)?.execute(ctx)?.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Stops at the first truthy operand.
fn or(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    for operand in args {
        if closure_arg("or", operand)?.execute(ctx)?.is_truthy() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn not(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(!args.iter().any(Value::is_truthy)))
}

fn is_not_nil(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(
        args.first().is_some_and(|value| !value.is_null_or_empty()),
    ))
}

/// True when every argument equals the first.
fn eq(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let Some((first, rest)) = args.split_first() else {
        return Err(arity_mismatch("builtins::eq", 2, 0));
    };
    Ok(Value::Bool(rest.iter().all(|value| value == first)))
}

fn neq(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [a, b] = args else {
        return Err(arity_mismatch("builtins::neq", 2, args.len()));
    };
    Ok(Value::Bool(a != b))
}
