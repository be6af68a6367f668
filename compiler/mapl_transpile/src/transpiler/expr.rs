//! Expressions and calls.

use mapl_diagnostic::{too_many_arguments, undeclared_variable};
use mapl_ir::{FunctionCall, FunctionReference, Span, ValueSource, WILDCARD_PACKAGE};
use mapl_stack::ensure_sufficient_stack;

use super::lift::desugar_iteration;
use super::Transpiler;
use crate::environment::Resolution;
use crate::errors::TranspileResult;
use crate::signature::ArgSpec;
use crate::syntax::{CallExpr, Expr, ExprKind, PathStep};

/// A call-site argument: still syntax, or already lowered (the selectee of
/// a path selector, path reads).
pub(super) enum CallArg<'e> {
    Syntax(&'e Expr),
    Ready(ValueSource),
}

impl Transpiler {
    pub(super) fn expr(&mut self, expr: &Expr) -> TranspileResult<ValueSource> {
        let source = ensure_sufficient_stack(|| self.expr_kind(expr))?;
        Ok(source.with_iterate(expr.iterate))
    }

    fn expr_kind(&mut self, expr: &Expr) -> TranspileResult<ValueSource> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Str(value) => Ok(ValueSource::string(value.clone(), span)),
            ExprKind::Int(value) => Ok(ValueSource::int(*value, span)),
            ExprKind::Float(value) => Ok(ValueSource::float(*value, span)),
            ExprKind::Bool(value) => Ok(ValueSource::bool(*value, span)),
            ExprKind::Var(name) => self.variable(name, span),
            ExprKind::Path { base, steps } => self.path(base, steps, span),
            ExprKind::Call(call) => {
                let reference = match &call.package {
                    Some(package) => FunctionReference::qualified(package.clone(), call.name.clone()),
                    None => FunctionReference::unqualified(call.name.clone()),
                };
                self.call(reference, syntax_args(&call.args), span)
            }
            ExprKind::Infix { op, lhs, rhs } => self.call(
                FunctionReference::builtin(op.builtin_name()),
                vec![CallArg::Syntax(lhs), CallArg::Syntax(rhs)],
                span,
            ),
            ExprKind::Unary { op, operand } => self.call(
                FunctionReference::builtin(op.builtin_name()),
                vec![CallArg::Syntax(operand)],
                span,
            ),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let mut args = vec![CallArg::Syntax(cond), CallArg::Syntax(then)];
                if let Some(otherwise) = otherwise {
                    args.push(CallArg::Syntax(otherwise));
                }
                self.call(FunctionReference::builtin("ternary"), args, span)
            }
            ExprKind::Block(block) => self.block(block),
            ExprKind::Array(items) => {
                self.call(FunctionReference::builtin("arrayOf"), syntax_args(items), span)
            }
        }
    }

    fn variable(&mut self, name: &str, span: Span) -> TranspileResult<ValueSource> {
        if self.env.resolve(name) == Resolution::Undeclared {
            self.report(undeclared_variable(span, name))?;
        }
        Ok(ValueSource::local(name, span))
    }

    /// `base.field[2][where ...]` becomes nested `get`/selector calls, each
    /// step taking the previous one as its first argument.
    fn path(&mut self, base: &Expr, steps: &[PathStep], span: Span) -> TranspileResult<ValueSource> {
        let mut current = self.expr(base)?;
        for step in steps {
            current = match step {
                PathStep::Field(field) => self.call(
                    FunctionReference::builtin("get"),
                    vec![
                        CallArg::Ready(current),
                        CallArg::Ready(ValueSource::string(field.clone(), span)),
                    ],
                    span,
                )?,
                PathStep::Index(index) => self.call(
                    FunctionReference::builtin("get"),
                    vec![
                        CallArg::Ready(current),
                        CallArg::Ready(ValueSource::int(*index, span)),
                    ],
                    span,
                )?,
                PathStep::Select(CallExpr {
                    package,
                    name,
                    args,
                }) => {
                    let package = package.as_deref().unwrap_or(WILDCARD_PACKAGE);
                    let mut call_args = Vec::with_capacity(args.len() + 1);
                    call_args.push(CallArg::Ready(current));
                    call_args.extend(args.iter().map(CallArg::Syntax));
                    self.call(FunctionReference::qualified(package, name.clone()), call_args, span)?
                }
            };
        }
        Ok(current)
    }

    /// Lower a call, shaping each argument by the callee's compile-time
    /// signature.
    pub(super) fn call(
        &mut self,
        reference: FunctionReference,
        args: Vec<CallArg<'_>>,
        span: Span,
    ) -> TranspileResult<ValueSource> {
        let count = args.len();
        let signature = self.signatures.lookup(&reference, count);
        if !signature.is_variadic() && count > signature.args().len() {
            self.report(too_many_arguments(
                span,
                &reference.to_string(),
                signature.args().len(),
                count,
            ))?;
        }

        let mut lowered = Vec::with_capacity(count);
        for (index, arg) in args.into_iter().enumerate() {
            let source = match (signature.spec_at(index), arg) {
                (_, CallArg::Ready(source)) => source,
                (Some(ArgSpec::Closure(spec)), CallArg::Syntax(expr)) => {
                    let free = spec.free_parameter_names(count - index - 1);
                    self.lambda(spec, free, expr)?
                }
                (Some(ArgSpec::Free(name)), CallArg::Syntax(expr)) => {
                    ValueSource::free(name.clone(), expr.span)
                }
                (Some(ArgSpec::Value) | None, CallArg::Syntax(expr)) => self.expr(expr)?,
            };
            lowered.push(source);
        }

        let call = FunctionCall::new(reference, lowered, span);
        if call.args.iter().any(|arg| arg.iterate) {
            return Ok(desugar_iteration(call));
        }
        Ok(ValueSource::call(call))
    }
}

fn syntax_args(exprs: &[Expr]) -> Vec<CallArg<'_>> {
    exprs.iter().map(CallArg::Syntax).collect()
}
