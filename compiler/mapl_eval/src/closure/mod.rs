//! Partially applied function calls.
//!
//! A [`Closure`] is a function reference plus argument values, some of
//! which are still unbound free parameters. Free parameters are bound one at
//! a time, lowest index first, and every bind returns a new closure: the
//! original is never mutated, so one partially bound closure can be bound
//! to many different elements, from many threads.
//!
//! ```text
//! selector-where_1($, limit=10)  --bind(7)-->  selector-where_1(7, 10)  --execute-->  dispatch
//! ```

use std::fmt;
use std::sync::Arc;

use mapl_ir::{FunctionCall, FunctionReference};

use crate::context::RuntimeContext;
use crate::errors::{no_free_parameters, no_matching_function, unbound_free_parameters, EvalResult};
use crate::value::Value;

/// Host callback behind a [`NativeUnaryClosure`].
pub type UnaryFn = Arc<dyn Fn(&mut RuntimeContext, Value) -> EvalResult + Send + Sync>;

/// A closure value.
#[derive(Clone, Debug)]
pub enum Closure {
    /// Call of a registered function, dispatched by overload on execute.
    Call(CallClosure),
    /// Host callback with exactly one free slot.
    NativeUnary(NativeUnaryClosure),
}

#[derive(Clone, Debug)]
pub struct CallClosure {
    reference: FunctionReference,
    args: Vec<Value>,
    /// Positions in `args` still holding free parameter markers, ascending.
    free: Vec<usize>,
}

#[derive(Clone)]
pub struct NativeUnaryClosure {
    name: String,
    func: UnaryFn,
    bound: Option<Value>,
}

impl fmt::Debug for NativeUnaryClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeUnaryClosure")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl Closure {
    /// Closure over `reference` with `args`; every
    /// [`Value::FreeParameter`] marker is a free slot.
    pub fn new(reference: FunctionReference, args: Vec<Value>) -> Self {
        let free = args
            .iter()
            .enumerate()
            .filter_map(|(i, arg)| arg.is_free_parameter().then_some(i))
            .collect();
        Closure::Call(CallClosure {
            reference,
            args,
            free,
        })
    }

    /// One-slot closure around a host callback.
    pub fn native_unary(
        name: impl Into<String>,
        func: impl Fn(&mut RuntimeContext, Value) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        Closure::NativeUnary(NativeUnaryClosure {
            name: name.into(),
            func: Arc::new(func),
            bound: None,
        })
    }

    /// Build a closure from an IR call: placeholders become free slots,
    /// nested closure-building calls become closure values and every other
    /// argument is evaluated now.
    pub fn from_call(call: &FunctionCall, ctx: &mut RuntimeContext) -> EvalResult<Closure> {
        let args = call
            .args
            .iter()
            .map(|arg| ctx.evaluate(arg))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Closure::new(call.reference.clone(), args))
    }

    pub fn name(&self) -> String {
        match self {
            Closure::Call(call) => call.reference.to_string(),
            Closure::NativeUnary(native) => native.name.clone(),
        }
    }

    /// Number of slots still to bind.
    pub fn free_count(&self) -> usize {
        match self {
            Closure::Call(call) => call.free.len(),
            Closure::NativeUnary(native) => usize::from(native.bound.is_none()),
        }
    }

    /// Argument values, markers included. Empty for native closures.
    pub fn args(&self) -> &[Value] {
        match self {
            Closure::Call(call) => &call.args,
            Closure::NativeUnary(_) => &[],
        }
    }

    /// New closure with the lowest free slot set to `value`.
    pub fn bind_next_free_parameter(&self, value: Value) -> EvalResult<Closure> {
        match self {
            Closure::Call(call) => {
                let Some((&slot, rest)) = call.free.split_first() else {
                    return Err(no_free_parameters(&call.reference));
                };
                let mut args = call.args.clone();
                args[slot] = value;
                Ok(Closure::Call(CallClosure {
                    reference: call.reference.clone(),
                    args,
                    free: rest.to_vec(),
                }))
            }
            Closure::NativeUnary(native) => {
                if native.bound.is_some() {
                    return Err(no_free_parameters(&native.name));
                }
                Ok(Closure::NativeUnary(NativeUnaryClosure {
                    bound: Some(value),
                    ..native.clone()
                }))
            }
        }
    }

    /// Bind `values` in order.
    pub fn bind_all(&self, values: impl IntoIterator<Item = Value>) -> EvalResult<Closure> {
        values
            .into_iter()
            .try_fold(self.clone(), |closure, value| closure.bind_next_free_parameter(value))
    }

    /// Run the closure. Every free slot must be bound.
    ///
    /// A call closure resolves the overloads of its reference (see
    /// `FunctionRegistry::search_packages`), lets the runtime's selector pick
    /// one, and invokes it through [`RuntimeContext::call`].
    pub fn execute(&self, ctx: &mut RuntimeContext) -> EvalResult {
        match self {
            Closure::Call(call) => call.execute(ctx),
            Closure::NativeUnary(native) => match &native.bound {
                Some(value) => (native.func)(ctx, value.clone()),
                None => Err(unbound_free_parameters(&native.name, 1)),
            },
        }
    }
}

impl CallClosure {
    pub fn reference(&self) -> &FunctionReference {
        &self.reference
    }

    #[tracing::instrument(level = "debug", skip_all, fields(function = %self.reference))]
    fn execute(&self, ctx: &mut RuntimeContext) -> EvalResult {
        if !self.free.is_empty() {
            return Err(unbound_free_parameters(&self.reference, self.free.len()));
        }

        let runtime = Arc::clone(ctx.runtime());
        let overloads = runtime.overloads(&self.reference, ctx.package());
        if overloads.is_empty() {
            let suggestions = runtime.suggestions(&self.reference, ctx.package());
            tracing::debug!(?suggestions, "no function found");
            return Err(no_matching_function(&self.reference, suggestions));
        }

        let selected = runtime
            .selector()
            .select(&self.reference.name, &overloads, &self.args)?;
        ctx.call(selected.as_ref(), &self.args)
    }
}
