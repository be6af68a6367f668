//! Lambda lifting and iteration desugaring.

use mapl_ir::{
    DefinitionKind, FieldMapping, FunctionCall, FunctionReference, Span, ValueSource,
};

use super::Transpiler;
use crate::environment::ScopeId;
use crate::errors::TranspileResult;
use crate::signature::ClosureSpec;
use crate::syntax::{Block, Expr};

impl Transpiler {
    /// Lift `body` into a standalone definition and return a closure
    /// expression over it.
    ///
    /// The closure's arguments are the free parameter placeholders followed
    /// by local reads of every captured name, so the runtime binds the free
    /// slots and receives captured values explicitly.
    pub(super) fn lambda(
        &mut self,
        spec: &ClosureSpec,
        free: Vec<String>,
        body: &Expr,
    ) -> TranspileResult<ValueSource> {
        let name = format!("{}{}", spec.prefix, self.names.next_id());
        let span = body.span;

        self.env.push_child(name, &free)?;
        let value = self.expr(body)?.with_iterate(false);
        let scope = self.env.pop()?;

        let definition = self.definition(
            scope,
            vec![FieldMapping::output(value)],
            spec.kind.inherits_parent_vars(),
            DefinitionKind::Lambda,
            span,
        );
        tracing::trace!(name = %definition.name, params = ?definition.params, "lifted lambda");

        let args = self.invocation_args(scope, &free, span);
        let reference = FunctionReference::qualified(self.package.clone(), definition.name.clone());
        self.definitions.push(definition);
        Ok(ValueSource::call(FunctionCall::new(reference, args, span).into_closure()))
    }

    /// Lift a `{ ... }` block into a definition that inherits its caller's
    /// variables and call it in place.
    pub(super) fn block(&mut self, block: &Block) -> TranspileResult<ValueSource> {
        let name = format!("block_{}", self.names.next_id());

        self.env.push_child(name, &[])?;
        let mappings = self.statements(&block.statements)?;
        let scope = self.env.pop()?;

        let definition =
            self.definition(scope, mappings, true, DefinitionKind::Block, block.span);
        tracing::trace!(name = %definition.name, params = ?definition.params, "lifted block");

        let args = self.invocation_args(scope, &[], block.span);
        let reference = FunctionReference::qualified(self.package.clone(), definition.name.clone());
        self.definitions.push(definition);
        Ok(ValueSource::call(FunctionCall::new(reference, args, block.span)))
    }

    /// Arguments passed where a lifted scope is invoked: one placeholder per
    /// free parameter, then the captured names read from the enclosing scope.
    fn invocation_args(&self, scope: ScopeId, free: &[String], span: Span) -> Vec<ValueSource> {
        let captured = self.env.scope(scope).captured();
        free.iter()
            .map(|name| ValueSource::free(name.clone(), span))
            .chain(captured.iter().map(|name| ValueSource::local(name, span)))
            .collect()
    }
}

/// Rewrite a call with broadcast arguments into
/// `builtins::iterate(<closure>, iterables...)`.
///
/// Each iterated argument is replaced by an `iteratedArg<position>` free
/// parameter, numbered by its index among all arguments, in a closure over
/// the original callee; the argument itself, with its broadcast flag
/// cleared, is passed to `iterate` in the same order.
pub(super) fn desugar_iteration(call: FunctionCall) -> ValueSource {
    let FunctionCall {
        reference,
        args,
        span,
        ..
    } = call;

    let mut iterables = Vec::new();
    let mut inner = Vec::with_capacity(args.len());
    for (position, arg) in args.into_iter().enumerate() {
        if arg.iterate {
            let placeholder = format!("iteratedArg{position}");
            inner.push(ValueSource::free(placeholder, arg.span));
            iterables.push(arg.with_iterate(false));
        } else {
            inner.push(arg);
        }
    }

    let mut operands = Vec::with_capacity(iterables.len() + 1);
    operands.push(ValueSource::call(FunctionCall::new(reference, inner, span).into_closure()));
    operands.extend(iterables);
    ValueSource::call(FunctionCall::new(
        FunctionReference::builtin("iterate"),
        operands,
        span,
    ))
}
