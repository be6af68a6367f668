//! Runtime and per-worker execution context.
//!
//! # Architecture
//!
//! - [`Runtime`] is shared (`Arc`) by every worker: the function registry,
//!   package aliases, the overload selector and the cancellation token.
//! - [`RuntimeContext`] is owned by one worker: the current package, the
//!   frame stack holding variables, and the call stack used to attribute
//!   errors.
//!
//! ```text
//!            Arc<Runtime>
//!           /     |      \
//!   RuntimeContext  ...  RuntimeContext   (one per rayon worker)
//! ```
//!
//! # Frames
//!
//! Every [`RuntimeContext::call`] pushes a frame. A frame whose function
//! inherits its parent's variables reads through to the nearest ancestor
//! (along the chain of inheriting frames) that has the variable, and writes
//! to the furthest such ancestor. `$this` never crosses a frame boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use mapl_ir::{
    FunctionReference, PipelineConfig, SourceKind, ValueSource, DEFAULT_PACKAGE, THIS_VAR,
};
use mapl_stack::ensure_sufficient_stack;

use crate::builtins::register_builtins;
use crate::closure::Closure;
use crate::dispatch::{DistanceSelector, OverloadSelector};
use crate::errors::{cancelled, BacktraceFrame, EvalBacktrace, EvalError, EvalResult};
use crate::function::{CallableFunction, NativeFn, NativeFunction, Signature};
use crate::ir_function::IrFunction;
use crate::registry::FunctionRegistry;
use crate::shared::SharedMutableRegistry;
use crate::value::Value;

/// Cooperative cancellation flag, checked before every function call.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State shared by every worker.
#[derive(Debug)]
pub struct Runtime {
    registry: SharedMutableRegistry<FunctionRegistry>,
    aliases: Vec<String>,
    selector: Box<dyn OverloadSelector>,
    cancellation: CancellationToken,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn register(&self, function: Arc<dyn CallableFunction>) {
        self.registry.write().register(function);
    }

    pub fn register_native(&self, signature: Signature, func: NativeFn) {
        self.register(Arc::new(NativeFunction::new(signature, func)));
    }

    /// Register every definition of `pipeline` under its package.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(package = %pipeline.package, definitions = pipeline.functions.len() + 1)
    )]
    pub fn load_pipeline(&self, pipeline: &PipelineConfig) {
        let mut registry = self.registry.write();
        for definition in pipeline.definitions() {
            registry.register(Arc::new(IrFunction::new(
                pipeline.package.clone(),
                definition.clone(),
            )));
        }
        tracing::debug!(total = registry.len(), "pipeline loaded");
    }

    /// Overloads of `reference` visible from `current`.
    pub fn overloads(
        &self,
        reference: &FunctionReference,
        current: &str,
    ) -> Vec<Arc<dyn CallableFunction>> {
        self.registry.read().lookup(reference, current, &self.aliases)
    }

    pub fn suggestions(&self, reference: &FunctionReference, current: &str) -> Vec<String> {
        self.registry
            .read()
            .suggestions(reference, current, &self.aliases)
    }

    pub fn registry(&self) -> &SharedMutableRegistry<FunctionRegistry> {
        &self.registry
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn selector(&self) -> &dyn OverloadSelector {
        self.selector.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fresh context for one worker.
    pub fn context(self: &Arc<Self>) -> RuntimeContext {
        RuntimeContext::new(Arc::clone(self))
    }
}

/// Builder for [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    aliases: Vec<String>,
    selector: Option<Box<dyn OverloadSelector>>,
    cancellation: Option<CancellationToken>,
    without_builtins: bool,
}

impl RuntimeBuilder {
    /// Search `package` for unqualified names too.
    #[must_use]
    pub fn alias(mut self, package: impl Into<String>) -> Self {
        self.aliases.push(package.into());
        self
    }

    #[must_use]
    pub fn selector(mut self, selector: impl OverloadSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Start with an empty registry.
    #[must_use]
    pub fn without_builtins(mut self) -> Self {
        self.without_builtins = true;
        self
    }

    pub fn build(self) -> Arc<Runtime> {
        let mut registry = FunctionRegistry::new();
        if !self.without_builtins {
            register_builtins(&mut registry);
        }
        Arc::new(Runtime {
            registry: SharedMutableRegistry::new(registry),
            aliases: self.aliases,
            selector: self
                .selector
                .unwrap_or_else(|| Box::new(DistanceSelector)),
            cancellation: self.cancellation.unwrap_or_default(),
        })
    }
}

#[derive(Debug)]
struct Frame {
    name: String,
    vars: FxHashMap<String, Value>,
    inherit_parent_vars: bool,
}

impl Frame {
    fn new(name: String, inherit_parent_vars: bool) -> Self {
        Frame {
            name,
            vars: FxHashMap::default(),
            inherit_parent_vars,
        }
    }
}

/// Execution state of one worker.
#[derive(Debug)]
pub struct RuntimeContext {
    runtime: Arc<Runtime>,
    package: String,
    frames: Vec<Frame>,
    call_stack: Vec<BacktraceFrame>,
    failure_trace: Option<EvalBacktrace>,
}

impl RuntimeContext {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        RuntimeContext {
            runtime,
            package: DEFAULT_PACKAGE.to_string(),
            frames: vec![Frame::new("<top>".to_string(), false)],
            call_stack: Vec::new(),
            failure_trace: None,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// New context on the same runtime and package, with no frames or
    /// call history. Used to hand work to another worker.
    pub fn fork(&self) -> RuntimeContext {
        RuntimeContext::new(Arc::clone(&self.runtime)).with_package(self.package.clone())
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Names of the active frames, innermost last.
    pub fn frame_names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.name.as_str())
    }

    /// Call stack snapshot of the first failure seen by this context.
    pub fn failure_trace(&self) -> Option<&EvalBacktrace> {
        self.failure_trace.as_ref()
    }

    pub fn take_failure_trace(&mut self) -> Option<EvalBacktrace> {
        self.failure_trace.take()
    }

    // Variables

    fn top(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Frames reachable from the top frame through inheritance, closest
    /// first.
    fn inherited_ancestors(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.top()), |&i| {
            if self.frames[i].inherit_parent_vars {
                i.checked_sub(1)
            } else {
                None
            }
        })
        .skip(1)
    }

    /// Look up a variable. A variable never written reads as `None`; the
    /// evaluator treats that as null.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        let top = self.frames.last()?;
        if let Some(value) = top.vars.get(name) {
            return Some(value);
        }
        if name == THIS_VAR {
            return None;
        }
        self.inherited_ancestors()
            .find_map(|i| self.frames[i].vars.get(name))
    }

    /// Write a variable: to the furthest inherited ancestor that already
    /// has it, else to the top frame.
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let index = if name == THIS_VAR {
            None
        } else {
            self.inherited_ancestors()
                .filter(|&i| self.frames[i].vars.contains_key(&name))
                .last()
        };
        let index = index.unwrap_or_else(|| self.top());
        self.frames[index].vars.insert(name, value);
    }

    /// Write a variable to the top frame only.
    pub fn set_local_var(&mut self, name: impl Into<String>, value: Value) {
        let top = self.top();
        self.frames[top].vars.insert(name.into(), value);
    }

    // Calls

    /// Invoke `function` in a new frame.
    ///
    /// Fails with `Cancelled` if the runtime's token is set. An error
    /// leaving the call gets the call stack attached (once, at the
    /// innermost frame), and the first such stack is kept as this
    /// context's [`failure_trace`](Self::failure_trace).
    pub fn call(&mut self, function: &dyn CallableFunction, args: &[Value]) -> EvalResult {
        if self.runtime.cancellation.is_cancelled() {
            return Err(cancelled());
        }

        let signature = function.signature();
        self.call_stack
            .push(BacktraceFrame::new(signature.qualified_name()));
        self.frames.push(Frame::new(
            signature.name.clone(),
            signature.inherits_parent_vars,
        ));

        let result = ensure_sufficient_stack(|| function.call(self, args));

        self.frames.pop();
        let result = result.map_err(|err| self.attribute(err));
        self.call_stack.pop();
        result
    }

    fn attribute(&mut self, err: EvalError) -> EvalError {
        if err.backtrace.is_some() {
            return err;
        }
        let trace = EvalBacktrace::new(self.call_stack.iter().rev().cloned().collect());
        if self.failure_trace.is_none() {
            self.failure_trace = Some(trace.clone());
        }
        err.with_backtrace(trace)
    }

    /// Evaluate an IR expression in the current frame.
    pub fn evaluate(&mut self, source: &ValueSource) -> EvalResult {
        ensure_sufficient_stack(|| match &source.kind {
            SourceKind::Empty => Ok(Value::Null),
            SourceKind::ConstString(s) => Ok(Value::string(s.as_str())),
            SourceKind::ConstInt(n) => Ok(Value::int(*n)),
            SourceKind::ConstFloat(n) => Ok(Value::number(*n)),
            SourceKind::ConstBool(b) => Ok(Value::Bool(*b)),
            SourceKind::FromLocal(name) => Ok(self.get_var(name).cloned().unwrap_or_default()),
            SourceKind::FreeParameter(name) => Ok(Value::free_parameter(name.as_str())),
            SourceKind::FunctionCall(call) => {
                let closure = Closure::from_call(call, self)?;
                if call.build_closure {
                    Ok(Value::closure(closure))
                } else {
                    closure.execute(self).map_err(|err| err.with_span(call.span))
                }
            }
        })
    }

    /// Run a loaded pipeline's root function on `input`.
    ///
    /// The root's first parameter receives the input; any further
    /// (auto-declared) parameters are null.
    #[tracing::instrument(level = "debug", skip_all, fields(package = %pipeline.package))]
    pub fn run(&mut self, pipeline: &PipelineConfig, input: Value) -> EvalResult {
        self.package.clone_from(&pipeline.package);
        let root = &pipeline.root;
        let mut args = vec![Value::Null; root.params.len()];
        if let Some(first) = args.first_mut() {
            *first = input;
        }
        Closure::new(
            FunctionReference::qualified(pipeline.package.clone(), root.name.clone()),
            args,
        )
        .execute(self)
    }
}
