//! Array selectors: `sortBy`, `sortByDescending`, `groupBy`, `uniqueBy`,
//! `last` and `join`.
//!
//! Key selectors run once per element, in order, before anything is
//! rearranged.

use std::cmp::Ordering;

use super::{closure_arg, native, ARRAY, CLOSURE};
use crate::closure::Closure;
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, invalid_argument, EvalResult};
use crate::registry::FunctionRegistry;
use crate::value::{Kind, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    native(registry, "sortBy", vec![ARRAY, CLOSURE], sort_by);
    native(registry, "sortByDescending", vec![ARRAY, CLOSURE], sort_by_descending);
    native(registry, "groupBy", vec![ARRAY, CLOSURE], group_by);
    native(registry, "uniqueBy", vec![ARRAY, CLOSURE], unique_by);
    native(registry, "last", vec![ARRAY], last);
    native(registry, "join", vec![ARRAY, ARRAY, CLOSURE], join);
}

/// Split `[items, selector]` and run the selector over every element.
fn keyed<'a>(
    ctx: &mut RuntimeContext,
    function: &str,
    args: &'a [Value],
) -> EvalResult<(&'a [Value], Vec<Value>)> {
    let [items, selector] = args else {
        return Err(arity_mismatch(format!("builtins::{function}"), 2, args.len()));
    };
    let selector = closure_arg(function, selector)?;
    let items = items.as_array().unwrap_or_default();
    let keys = items
        .iter()
        .map(|item| selector.bind_next_free_parameter(item.clone())?.execute(ctx))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok((items, keys))
}

fn sort_by(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    sort(ctx, "sortBy", args, false)
}

fn sort_by_descending(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    sort(ctx, "sortByDescending", args, true)
}

/// Stable sort by primitive keys; null keys sort as the smallest.
fn sort(ctx: &mut RuntimeContext, function: &str, args: &[Value], descending: bool) -> EvalResult {
    let (items, keys) = keyed(ctx, function, args)?;
    check_sort_keys(function, &keys)?;

    let mut pairs: Vec<(&Value, &Value)> = keys.iter().zip(items).collect();
    pairs.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    Ok(Value::array(pairs.into_iter().map(|(_, item)| item.clone()).collect()))
}

/// Keys must be null or primitives of one kind.
fn check_sort_keys(function: &str, keys: &[Value]) -> EvalResult<()> {
    let mut seen: Option<Kind> = None;
    for key in keys {
        let kind = key.kind();
        match kind {
            Kind::Null => {}
            Kind::Number | Kind::String | Kind::Boolean => match seen {
                Some(previous) if previous != kind => {
                    return Err(invalid_argument(
                        function,
                        format!("cannot compare {} keys with {} keys", previous.name(), kind.name()),
                    ));
                }
                _ => seen = Some(kind),
            },
            _ => {
                return Err(invalid_argument(
                    function,
                    format!("sort keys must be primitives, got {}", key.type_name()),
                ));
            }
        }
    }
    Ok(())
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a.unwrapped(), b.unwrapped()) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.as_str().cmp(y.as_str()),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (a, b) => is_null_key(b).cmp(&is_null_key(a)),
    }
}

fn is_null_key(key: &Value) -> bool {
    key.kind() == Kind::Null
}

/// `[{key, elements}]`, one entry per distinct key in first-seen order.
fn group_by(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (items, keys) = keyed(ctx, "groupBy", args)?;
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for (key, item) in keys.into_iter().zip(items) {
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(item.clone()),
            None => groups.push((key, vec![item.clone()])),
        }
    }
    Ok(Value::array(
        groups
            .into_iter()
            .map(|(key, members)| {
                Value::container([("key", key), ("elements", Value::array(members))])
            })
            .collect(),
    ))
}

/// The first element with each key survives; order is kept.
fn unique_by(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let (items, keys) = keyed(ctx, "uniqueBy", args)?;
    let mut seen: Vec<Value> = Vec::new();
    let mut kept = Vec::new();
    for (key, item) in keys.into_iter().zip(items) {
        if !seen.contains(&key) {
            seen.push(key);
            kept.push(item.clone());
        }
    }
    Ok(Value::array(kept))
}

fn last(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(args
        .first()
        .and_then(Value::as_array)
        .and_then(<[Value]>::last)
        .cloned()
        .unwrap_or_default())
}

/// Full outer join into `[left, right]` pairs.
///
/// Each left element is paired with the first still-unmatched right element
/// the predicate accepts, or null. Right elements nobody matched follow as
/// `[null, right]`. Every element is matched at most once.
fn join(ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    let [left, right, predicate] = args else {
        return Err(arity_mismatch("builtins::join", 3, args.len()));
    };
    let predicate = closure_arg("join", predicate)?;
    check_pair_predicate(predicate)?;

    let mut unmatched: Vec<&Value> = right.as_array().unwrap_or_default().iter().collect();
    let mut joined = Vec::new();
    for l in left.as_array().unwrap_or_default() {
        let mut matched = None;
        for (i, r) in unmatched.iter().enumerate() {
            let accepted = predicate
                .bind_all([l.clone(), (*r).clone()])?
                .execute(ctx)?
                .is_truthy();
            if accepted {
                matched = Some(i);
                break;
            }
        }
        let r = matched.map_or(Value::Null, |i| unmatched.remove(i).clone());
        joined.push(Value::array(vec![l.clone(), r]));
    }
    joined.extend(
        unmatched
            .into_iter()
            .map(|r| Value::array(vec![Value::Null, r.clone()])),
    );
    Ok(Value::array(joined))
}

fn check_pair_predicate(predicate: &Closure) -> EvalResult<()> {
    if predicate.free_count() == 2 {
        Ok(())
    } else {
        Err(invalid_argument(
            "join",
            format!("predicate {} must take 2 free parameters", predicate.name()),
        ))
    }
}
