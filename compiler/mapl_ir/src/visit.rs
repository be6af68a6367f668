//! Read-only traversal helpers over IR expressions.

use crate::{FunctionCall, FunctionDefinition, SourceKind, ValueSource};

/// Visit every call nested in `source`, outermost first, arguments in order.
pub fn walk_calls<'a>(source: &'a ValueSource, f: &mut impl FnMut(&'a FunctionCall)) {
    if let SourceKind::FunctionCall(call) = &source.kind {
        f(call);
        for arg in &call.args {
            walk_calls(arg, f);
        }
    }
}

/// Visit every call in every mapping value of `definition`.
pub fn walk_definition_calls<'a>(
    definition: &'a FunctionDefinition,
    f: &mut impl FnMut(&'a FunctionCall),
) {
    for mapping in &definition.mappings {
        walk_calls(&mapping.value, f);
    }
}

/// Collect the names of every local read in `source`, in visiting order.
pub fn local_reads(source: &ValueSource) -> Vec<&str> {
    fn collect<'a>(source: &'a ValueSource, out: &mut Vec<&'a str>) {
        match &source.kind {
            SourceKind::FromLocal(name) => out.push(name),
            SourceKind::FunctionCall(call) => {
                for arg in &call.args {
                    collect(arg, out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    collect(source, &mut out);
    out
}
