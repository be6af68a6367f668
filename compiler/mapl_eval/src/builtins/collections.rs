//! Array literals and path reads.

use super::{native, native_variadic, NULL};
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, EvalResult};
use crate::function::ArgType;
use crate::registry::FunctionRegistry;
use crate::value::{Kind, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    native_variadic(registry, "arrayOf", vec![ArgType::Any], array_of);

    native(
        registry,
        "get",
        vec![ArgType::Exact(Kind::Container), ArgType::Exact(Kind::String)],
        get_field,
    );
    native(
        registry,
        "get",
        vec![ArgType::Exact(Kind::Array), ArgType::Exact(Kind::Number)],
        get_index,
    );
    native(registry, "get", vec![NULL, ArgType::Any], get_null);
}

/// `[a, b, c]`. A single array argument is unpacked, so `[xs]` is `xs`.
fn array_of(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(Value::array(args.to_vec()))
}

fn get_field(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [container, name] = args else {
        return Err(arity_mismatch("builtins::get", 2, args.len()));
    };
    Ok(container.field(name.as_str().unwrap_or_default()))
}

/// Element at a whole, in-range index; null otherwise.
#[allow(clippy::float_cmp, reason = "a whole number has an exact zero fraction")]
fn get_index(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [items, index] = args else {
        return Err(arity_mismatch("builtins::get", 2, args.len()));
    };
    let items = items.as_array().unwrap_or_default();
    let element = index
        .as_number()
        .filter(|n| n.fract() == 0.0 && *n >= 0.0)
        .and_then(|n| {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "checked whole and non-negative above"
            )]
            let i = n as usize;
            items.get(i)
        });
    Ok(element.cloned().unwrap_or_default())
}

fn get_null(_: &mut RuntimeContext, _: &[Value]) -> EvalResult {
    Ok(Value::Null)
}
