//! Arithmetic and comparison operators over primitives.

use super::{native, native_variadic, number_arg, PRIMITIVE};
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, EvalResult};
use crate::registry::FunctionRegistry;
use crate::value::{Kind, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    native_variadic(registry, "sum", vec![PRIMITIVE, PRIMITIVE], sum);
    native(registry, "sub", vec![PRIMITIVE, PRIMITIVE], sub);
    native(registry, "mul", vec![PRIMITIVE, PRIMITIVE], mul);
    native(registry, "div", vec![PRIMITIVE, PRIMITIVE], div);

    native(registry, "gt", vec![PRIMITIVE, PRIMITIVE], gt);
    native(registry, "lt", vec![PRIMITIVE, PRIMITIVE], lt);
    native(registry, "gtEq", vec![PRIMITIVE, PRIMITIVE], gt_eq);
    native(registry, "ltEq", vec![PRIMITIVE, PRIMITIVE], lt_eq);
}

/// Numbers add up; if any operand is a string the operands are
/// concatenated as text instead.
fn sum(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    if args.iter().any(|value| value.kind() == Kind::String) {
        return Ok(Value::string(
            args.iter().map(Value::to_text).collect::<String>(),
        ));
    }
    args.iter()
        .try_fold(0.0, |total, value| -> EvalResult<f64> {
            Ok(total + operand("sum", value)?)
        })
        .map(Value::number)
}

/// Null operands count as zero.
fn operand(function: &str, value: &Value) -> EvalResult<f64> {
    if value.is_null_or_empty() {
        Ok(0.0)
    } else {
        number_arg(function, value)
    }
}

fn binary(function: &str, args: &[Value]) -> EvalResult<(f64, f64)> {
    let [a, b] = args else {
        return Err(arity_mismatch(format!("builtins::{function}"), 2, args.len()));
    };
    Ok((operand(function, a)?, operand(function, b)?))
}

fn sub(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("sub", args)?;
    Ok(Value::number(a - b))
}

fn mul(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("mul", args)?;
    Ok(Value::number(a * b))
}

fn div(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("div", args)?;
    Ok(Value::number(a / b))
}

fn gt(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("gt", args)?;
    Ok(Value::Bool(a > b))
}

fn lt(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("lt", args)?;
    Ok(Value::Bool(a < b))
}

fn gt_eq(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("gtEq", args)?;
    Ok(Value::Bool(a >= b))
}

fn lt_eq(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (a, b) = binary("ltEq", args)?;
    Ok(Value::Bool(a <= b))
}
