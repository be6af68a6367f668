//! Functions defined in Pipeline IR.

use mapl_ir::{FieldMapping, FunctionDefinition, Target, THIS_VAR};

use crate::builtins::iterate_values;
use crate::closure::Closure;
use crate::context::RuntimeContext;
use crate::errors::{arity_mismatch, invalid_argument, EvalResult};
use crate::function::{ArgType, CallableFunction, Signature};
use crate::value::Value;

/// A [`FunctionDefinition`] registered as a callable: every parameter
/// accepts any value, and the result is the frame's `$this` after all
/// mappings ran.
#[derive(Debug)]
pub struct IrFunction {
    signature: Signature,
    definition: FunctionDefinition,
}

impl IrFunction {
    pub fn new(package: impl Into<String>, definition: FunctionDefinition) -> Self {
        let signature = Signature::new(
            package,
            definition.name.clone(),
            vec![ArgType::Any; definition.params.len()],
        )
        .inheriting(definition.inherit_parent_vars);
        IrFunction {
            signature,
            definition,
        }
    }

    pub fn definition(&self) -> &FunctionDefinition {
        &self.definition
    }

    fn execute_mapping(&self, ctx: &mut RuntimeContext, mapping: &FieldMapping) -> EvalResult<()> {
        let value = ctx.evaluate(&mapping.value)?;
        if !mapping.iterate_source {
            return write_target(ctx, &mapping.target, value);
        }

        // Each element of the source is written to the target separately.
        if value.is_null_or_empty() {
            return Ok(());
        }
        if !matches!(
            value.unwrapped(),
            Value::Array(_) | Value::Container(_) | Value::Dataset(_)
        ) {
            return Err(invalid_argument(
                &self.definition.name,
                format!("cannot iterate over {}", value.type_name()),
            ));
        }
        let target = mapping.target.clone();
        let writer = Closure::native_unary("target-writer", move |ctx, element| {
            write_target(ctx, &target, element)?;
            Ok(Value::Null)
        });
        iterate_values(ctx, &writer, &[value])?;
        Ok(())
    }
}

impl CallableFunction for IrFunction {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
        let params = &self.definition.params;
        if args.len() != params.len() {
            return Err(arity_mismatch(
                self.signature.qualified_name(),
                params.len(),
                args.len(),
            ));
        }

        // Inheriting frames bind through to an ancestor that already
        // holds the name.
        for (param, arg) in params.iter().zip(args) {
            ctx.set_var(param.as_str(), arg.clone());
        }
        for mapping in &self.definition.mappings {
            self.execute_mapping(ctx, mapping)
                .map_err(|err| err.with_span(mapping.span))?;
        }
        Ok(ctx.get_var(THIS_VAR).cloned().unwrap_or_default())
    }
}

/// Store `value` at `target` in the current frame.
///
/// Output and field writes merge into `$this` and skip null or empty
/// values. A variable write replaces the variable, unless it goes through a
/// path (or is `$this` itself), in which case it merges.
pub(crate) fn write_target(ctx: &mut RuntimeContext, target: &Target, value: Value) -> EvalResult<()> {
    let (name, path) = match target {
        Target::Output | Target::Field { .. } if value.is_null_or_empty() => return Ok(()),
        Target::Output => (THIS_VAR, &[][..]),
        Target::Field { path } => (THIS_VAR, path.as_slice()),
        Target::Var { name, path } if path.is_empty() && name != THIS_VAR => {
            ctx.set_var(name.as_str(), value);
            return Ok(());
        }
        Target::Var { name, path } => (name.as_str(), path.as_slice()),
    };
    let current = ctx.get_var(name).cloned().unwrap_or_default();
    let updated = current.with_path(path, value, true)?;
    ctx.set_var(name, updated);
    Ok(())
}
