//! Overload dispatch by structural distance.
//!
//! Every overload of a name gets a distance to the concrete arguments:
//! lower is a better match, infinity is no match. The unique minimum wins.
//!
//! | declared type        | value                           | distance |
//! |----------------------|---------------------------------|----------|
//! | `Exact(kind)`        | value of that kind              | 0        |
//! | `Exact(Null)`        | null or empty value             | 0        |
//! | `Capability(c)`      | value with capability `c`       | 1        |
//! | `Any`                | anything                        | 2        |
//! | exact or capability  | adapter-wrapped value           | inner + [`WRAPPER_EPSILON`] |
//! | otherwise            |                                 | infinity |

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::errors::{ambiguous_overload, no_matching_overload, EvalResult};
use crate::function::{ArgType, CallableFunction, Signature};
use crate::value::{Kind, Value};

/// Added per adapter layer, so a wrapped match is worse than a direct one
/// but better than a mismatch.
///
/// Distances of up to about `1 / WRAPPER_EPSILON` (100,000) wrapped
/// variadic arguments stay distinguishable from the next integer distance;
/// beyond that the ordering is not guaranteed.
pub const WRAPPER_EPSILON: f64 = 1e-5;

/// Added when a single array argument is unpacked into a variadic slot.
pub const UNPACK_PENALTY: f64 = 0.1;

/// Distance between a declared argument type and a value.
///
/// Matches that hold for the adapter itself (null-or-empty, `Any`) are
/// scored directly; only the kind and capability checks look through an
/// adapter, paying [`WRAPPER_EPSILON`] per layer.
pub fn distance(want: ArgType, value: &Value) -> f64 {
    match (want, value) {
        (ArgType::Exact(Kind::Null), value) if value.is_null_or_empty() => 0.0,
        (ArgType::Any, _) => 2.0,
        (want, Value::Wrapped(inner)) => WRAPPER_EPSILON + distance(want, inner),
        (ArgType::Exact(kind), value) if value.kind() == kind => 0.0,
        (ArgType::Capability(capability), value) if value.has_capability(capability) => 1.0,
        _ => f64::INFINITY,
    }
}

/// Sum of positional distances, or infinity if the arity does not fit or
/// any position mismatches.
///
/// The variadic slot accepts three shapes: omitted, one array argument
/// whose elements are unpacked (adds [`UNPACK_PENALTY`]; not done when the
/// slot type itself targets arrays), or any number of trailing arguments.
/// Its distance is the maximum over its elements, not the sum.
pub fn signature_distance(signature: &Signature, args: &[Value]) -> f64 {
    let wanted = &signature.args;
    let mut total = 0.0;
    for (i, &want) in wanted.iter().enumerate() {
        if signature.variadic && i + 1 == wanted.len() {
            let rest = args.get(i..).unwrap_or_default();
            return total + variadic_distance(want, rest);
        }
        let Some(arg) = args.get(i) else {
            return f64::INFINITY;
        };
        let d = distance(want, arg);
        if d.is_infinite() {
            return f64::INFINITY;
        }
        total += d;
    }
    if args.len() > wanted.len() {
        f64::INFINITY
    } else {
        total
    }
}

fn variadic_distance(want: ArgType, rest: &[Value]) -> f64 {
    let (elements, penalty) = match rest {
        [single] if !want.targets_arrays() => match single.unwrapped() {
            Value::Array(items) => (&items[..], UNPACK_PENALTY),
            _ => (rest, 0.0),
        },
        _ => (rest, 0.0),
    };
    elements
        .iter()
        .map(|element| distance(want, element))
        .fold(0.0, f64::max)
        + penalty
}

/// Arguments as a variadic function receives them: a single array in the
/// variadic slot is unpacked into its elements, matching the shape
/// [`signature_distance`] scored.
pub fn normalize_args<'a>(signature: &Signature, args: &'a [Value]) -> Cow<'a, [Value]> {
    let Some(&last) = signature.args.last() else {
        return Cow::Borrowed(args);
    };
    if !signature.variadic || last.targets_arrays() || args.len() != signature.args.len() {
        return Cow::Borrowed(args);
    }
    let Some((single, fixed)) = args.split_last() else {
        return Cow::Borrowed(args);
    };
    match single.unwrapped() {
        Value::Array(items) => {
            let mut unpacked = fixed.to_vec();
            unpacked.extend(items.iter().cloned());
            Cow::Owned(unpacked)
        }
        _ => Cow::Borrowed(args),
    }
}

/// Picks the overload to run for a call.
pub trait OverloadSelector: Send + Sync + fmt::Debug {
    /// `name` is only used in error messages.
    fn select(
        &self,
        name: &str,
        overloads: &[Arc<dyn CallableFunction>],
        args: &[Value],
    ) -> EvalResult<Arc<dyn CallableFunction>>;
}

/// Default selector: unique minimum [`signature_distance`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DistanceSelector;

impl OverloadSelector for DistanceSelector {
    #[allow(clippy::float_cmp, reason = "ties are exact repeats of the same sums")]
    fn select(
        &self,
        name: &str,
        overloads: &[Arc<dyn CallableFunction>],
        args: &[Value],
    ) -> EvalResult<Arc<dyn CallableFunction>> {
        if let [only] = overloads {
            return if signature_distance(only.signature(), args).is_finite() {
                Ok(Arc::clone(only))
            } else {
                Err(no_matching_overload(name, args))
            };
        }

        let mut best: Option<(usize, f64)> = None;
        let mut tied = false;
        for (index, overload) in overloads.iter().enumerate() {
            let d = signature_distance(overload.signature(), args);
            if d.is_infinite() {
                continue;
            }
            match best {
                Some((_, min)) if d == min => tied = true,
                Some((_, min)) if d > min => {}
                _ => {
                    best = Some((index, d));
                    tied = false;
                }
            }
        }

        let Some((index, min)) = best else {
            return Err(no_matching_overload(name, args));
        };
        if tied {
            let candidates = overloads
                .iter()
                .filter(|o| signature_distance(o.signature(), args) == min)
                .map(|o| o.signature().to_string())
                .collect();
            return Err(ambiguous_overload(name, candidates));
        }

        tracing::trace!(
            function = name,
            selected = %overloads[index].signature(),
            distance = min,
            "selected overload"
        );
        Ok(Arc::clone(&overloads[index]))
    }
}

/// Distance of every overload, in registration order. Used by tooling to
/// explain a dispatch decision.
pub fn rank(overloads: &[Arc<dyn CallableFunction>], args: &[Value]) -> Vec<(Signature, f64)> {
    overloads
        .iter()
        .map(|o| (o.signature().clone(), signature_distance(o.signature(), args)))
        .collect()
}
