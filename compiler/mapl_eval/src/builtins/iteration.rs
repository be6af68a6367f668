//! `iterate`, `where` and `reduce`.

use std::collections::BTreeSet;

use rayon::prelude::*;

use super::{closure_arg, native, native_variadic, ARRAY, CLOSURE, CONTAINER, NULL};
use crate::closure::Closure;
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, invalid_argument, EvalResult};
use crate::function::ArgType;
use crate::registry::FunctionRegistry;
use crate::value::{Fields, Kind, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    native_variadic(registry, "iterate", vec![CLOSURE, NULL], iterate_null);
    native_variadic(registry, "iterate", vec![CLOSURE, ARRAY], iterate_arrays);
    native_variadic(registry, "iterate", vec![CLOSURE, CONTAINER], iterate_containers);
    native(
        registry,
        "iterate",
        vec![CLOSURE, ArgType::Exact(Kind::Dataset)],
        iterate_dataset,
    );

    native(registry, "where", vec![NULL, CLOSURE], where_null);
    native(registry, "where", vec![ARRAY, CLOSURE], where_array);
    native(registry, "where", vec![CONTAINER, CLOSURE], where_container);

    native(registry, "reduce", vec![ARRAY, CLOSURE], reduce);
    native(registry, "reduce", vec![ARRAY, ArgType::Any, CLOSURE], reduce);
}

/// Sequentially apply `closure` over `iterables`, which must all be arrays
/// (or null) or all containers. A dataset is walked like an array.
pub(crate) fn iterate_values(
    ctx: &mut RuntimeContext,
    closure: &Closure,
    iterables: &[Value],
) -> EvalResult {
    if iterables.iter().all(Value::is_null_or_empty) {
        return Ok(Value::Null);
    }
    if let Some(containers) = iterables
        .iter()
        .map(|v| v.as_container().or_else(|| v.is_null_or_empty().then_some(&EMPTY)))
        .collect::<Option<Vec<&Fields>>>()
    {
        return map_containers(ctx, closure, &containers);
    }
    let arrays = iterables
        .iter()
        .map(|v| match v.unwrapped() {
            Value::Array(items) | Value::Dataset(items) => Ok(&items[..]),
            empty if empty.is_null_or_empty() => Ok(&[][..]),
            other => Err(invalid_argument(
                "iterate",
                format!("cannot iterate over {}", other.type_name()),
            )),
        })
        .collect::<EvalResult<Vec<_>>>()?;
    map_arrays(ctx, closure, &arrays)
}

static EMPTY: Fields = Fields::new();

fn check_free_count(closure: &Closure, iterables: usize) -> EvalResult<()> {
    if closure.free_count() == iterables {
        Ok(())
    } else {
        Err(invalid_argument(
            "iterate",
            format!(
                "closure {} has {} free parameter(s) but {iterables} iterable(s) were given",
                closure.name(),
                closure.free_count()
            ),
        ))
    }
}

/// Zip the arrays element-wise. Empty arrays broadcast null; the others
/// must have one common size. Null or empty results are dropped.
fn map_arrays(ctx: &mut RuntimeContext, closure: &Closure, arrays: &[&[Value]]) -> EvalResult {
    check_free_count(closure, arrays.len())?;

    let mut size = None;
    for items in arrays.iter().filter(|items| !items.is_empty()) {
        match size {
            None => size = Some(items.len()),
            Some(expected) if expected != items.len() => {
                return Err(invalid_argument(
                    "iterate",
                    format!("arrays have different sizes: {expected} and {}", items.len()),
                ));
            }
            Some(_) => {}
        }
    }
    let Some(size) = size else {
        return Ok(Value::Null);
    };

    let mut results = Vec::with_capacity(size);
    for i in 0..size {
        let bound =
            closure.bind_all(arrays.iter().map(|items| items.get(i).cloned().unwrap_or_default()))?;
        let result = bound.execute(ctx)?;
        if !result.is_null_or_empty() {
            results.push(result);
        }
    }
    Ok(Value::array(results))
}

/// Walk the union of keys; a key missing from one container binds null.
/// Results keep their key; null or empty results are dropped.
fn map_containers(
    ctx: &mut RuntimeContext,
    closure: &Closure,
    containers: &[&Fields],
) -> EvalResult {
    check_free_count(closure, containers.len())?;

    let keys: BTreeSet<&String> = containers.iter().flat_map(|fields| fields.keys()).collect();
    let mut results = Fields::new();
    for key in keys {
        let bound = closure.bind_all(
            containers
                .iter()
                .map(|fields| fields.get(key).cloned().unwrap_or_default()),
        )?;
        let result = bound.execute(ctx)?;
        if !result.is_null_or_empty() {
            results.insert(key.clone(), result);
        }
    }
    Ok(Value::container(results))
}

fn iterate_null(_: &mut RuntimeContext, _: &[Value]) -> EvalResult {
    Ok(Value::Null)
}

fn iterate_arrays(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let Some((closure, iterables)) = args.split_first() else {
        return Err(arity_mismatch("builtins::iterate", 1, 0));
    };
    let closure = closure_arg("iterate", closure)?;
    let arrays: Vec<&[Value]> = iterables
        .iter()
        .map(|v| v.as_array().unwrap_or_default())
        .collect();
    map_arrays(ctx, closure, &arrays)
}

fn iterate_containers(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let Some((closure, iterables)) = args.split_first() else {
        return Err(arity_mismatch("builtins::iterate", 1, 0));
    };
    let closure = closure_arg("iterate", closure)?;
    let containers: Vec<&Fields> = iterables
        .iter()
        .map(|v| v.as_container().unwrap_or(&EMPTY))
        .collect();
    map_containers(ctx, closure, &containers)
}

/// Map over a dataset in parallel, one forked context per element.
/// Results are kept as they are, in input order.
fn iterate_dataset(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [closure, dataset] = args else {
        return Err(arity_mismatch("builtins::iterate", 2, args.len()));
    };
    let Value::Dataset(items) = dataset.unwrapped() else {
        return Err(invalid_argument(
            "iterate",
            format!("expected a dataset, got {}", dataset.type_name()),
        ));
    };
    let closure = closure_arg("iterate", closure)?;
    check_free_count(closure, 1)?;

    let parent: &RuntimeContext = ctx;
    let results = items
        .par_iter()
        .map(|item| {
            let mut worker = parent.fork();
            closure
                .bind_next_free_parameter(item.clone())?
                .execute(&mut worker)
        })
        .collect::<EvalResult<Vec<_>>>()?;
    tracing::debug!(elements = results.len(), "dataset mapped");
    Ok(Value::dataset(results))
}

fn where_null(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(args.first().cloned().unwrap_or_default())
}

fn where_array(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [items, predicate] = args else {
        return Err(arity_mismatch("builtins::where", 2, args.len()));
    };
    let predicate = closure_arg("where", predicate)?;
    let mut kept = Vec::new();
    for item in items.as_array().unwrap_or_default() {
        let keep = predicate
            .bind_next_free_parameter(item.clone())?
            .execute(ctx)?;
        if keep.is_truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::array(kept))
}

/// The predicate sees each entry as `{field, value}`.
fn where_container(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [fields, predicate] = args else {
        return Err(arity_mismatch("builtins::where", 2, args.len()));
    };
    let predicate = closure_arg("where", predicate)?;
    let mut kept = Fields::new();
    for (name, value) in fields.as_container().unwrap_or(&EMPTY) {
        let entry = Value::container([
            ("field", Value::string(name.as_str())),
            ("value", value.clone()),
        ]);
        if predicate.bind_next_free_parameter(entry)?.execute(ctx)?.is_truthy() {
            kept.insert(name.clone(), value.clone());
        }
    }
    Ok(Value::container(kept))
}

/// `reduce(items, f)` folds from the first element, `reduce(items, init, f)`
/// from `init`. `f` takes the accumulator then the current element.
fn reduce(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (items, init, reducer) = match args {
        [items, reducer] => (items, None, reducer),
        [items, init, reducer] => (items, Some(init.clone()), reducer),
        _ => return Err(arity_mismatch("builtins::reduce", 2, args.len())),
    };
    let reducer = closure_arg("reduce", reducer)?;
    if reducer.free_count() != 2 {
        return Err(invalid_argument(
            "reduce",
            format!("reducer {} must take 2 free parameters", reducer.name()),
        ));
    }

    let mut items = items.as_array().unwrap_or_default().iter().cloned();
    let Some(mut acc) = init.or_else(|| items.next()) else {
        return Ok(Value::Null);
    };
    for item in items {
        acc = reducer.bind_all([acc, item])?.execute(ctx)?;
    }
    Ok(acc)
}
