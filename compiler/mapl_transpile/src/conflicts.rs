//! Variable/field name conflicts.
//!
//! A function frame and every block that inherits it share one namespace
//! for variables and output fields: writing `var total` and a `total` field
//! in the same frame is ambiguous for readers and is reported.

use rustc_hash::{FxHashMap, FxHashSet};

use mapl_diagnostic::{var_field_conflict, Diagnostic};
use mapl_ir::visit::walk_calls;
use mapl_ir::{FunctionDefinition, PipelineConfig, Span, Target};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum WriteKind {
    Var,
    Field,
}

/// Report every name written both as a variable and as a field within one
/// frame (a non-inheriting definition plus the inheriting definitions it
/// invokes, transitively).
pub fn check_var_field_conflicts(pipeline: &PipelineConfig) -> Vec<Diagnostic> {
    let by_name: FxHashMap<&str, &FunctionDefinition> = pipeline
        .functions
        .iter()
        .map(|def| (def.name.as_str(), def))
        .collect();

    let mut conflicts = Vec::new();
    for frame in pipeline.definitions().filter(|def| !def.inherit_parent_vars) {
        let mut walk = FrameWalk {
            by_name: &by_name,
            writes: FxHashMap::default(),
            visited: FxHashSet::default(),
            conflicts: &mut conflicts,
        };
        walk.definition(frame);
    }
    conflicts
}

struct FrameWalk<'p, 'o> {
    by_name: &'o FxHashMap<&'p str, &'p FunctionDefinition>,
    writes: FxHashMap<&'p str, (WriteKind, Span)>,
    visited: FxHashSet<&'p str>,
    conflicts: &'o mut Vec<Diagnostic>,
}

impl<'p> FrameWalk<'p, '_> {
    fn definition(&mut self, def: &'p FunctionDefinition) {
        if !self.visited.insert(def.name.as_str()) {
            return;
        }

        for mapping in &def.mappings {
            let mut inherited = Vec::new();
            walk_calls(&mapping.value, &mut |call| {
                if let Some(&callee) = self.by_name.get(call.reference.name.as_str()) {
                    if callee.inherit_parent_vars {
                        inherited.push(callee);
                    }
                }
            });
            for callee in inherited {
                self.definition(callee);
            }

            let kind = match &mapping.target {
                Target::Output => continue,
                Target::Var { .. } => WriteKind::Var,
                Target::Field { .. } => WriteKind::Field,
            };
            let Some(name) = mapping.target.root_name() else {
                continue;
            };

            if let Some(&(previous, earlier)) = self.writes.get(name) {
                if previous != kind {
                    self.conflicts.push(var_field_conflict(
                        mapping.span,
                        earlier,
                        name,
                        kind == WriteKind::Var,
                    ));
                }
            }
            self.writes.insert(name, (kind, mapping.span));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use mapl_diagnostic::ErrorCode;
    use mapl_ir::{
        DefinitionKind, FieldMapping, FunctionCall, FunctionReference, PathSegment, ValueSource,
        ROOT_VAR,
    };

    use super::*;

    fn def(name: &str, inherit: bool, mappings: Vec<FieldMapping>) -> FunctionDefinition {
        FunctionDefinition {
            name: name.into(),
            params: vec![ROOT_VAR.into()],
            inherit_parent_vars: inherit,
            mappings,
            kind: if inherit {
                DefinitionKind::Block
            } else {
                DefinitionKind::Root
            },
            span: Span::DUMMY,
        }
    }

    fn write(target: Target, line: u32) -> FieldMapping {
        FieldMapping {
            value: ValueSource::int(1, Span::DUMMY),
            target,
            iterate_source: false,
            span: Span::on_line(line, 1, 5),
        }
    }

    fn var(name: &str) -> Target {
        Target::Var {
            name: name.into(),
            path: Vec::new(),
        }
    }

    fn field(name: &str) -> Target {
        Target::Field {
            path: vec![PathSegment::Field(name.into())],
        }
    }

    fn pipeline(root: FunctionDefinition, functions: Vec<FunctionDefinition>) -> PipelineConfig {
        PipelineConfig {
            package: "test".into(),
            root,
            functions,
        }
    }

    #[test]
    fn test_conflict_in_same_frame() {
        let root = def("root", false, vec![write(var("total"), 1), write(field("total"), 2)]);
        let found = check_var_field_conflicts(&pipeline(root, vec![]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, ErrorCode::E1002);
        assert_eq!(found[0].primary_span(), Some(Span::on_line(2, 1, 5)));
    }

    #[test]
    fn test_same_kind_repeated_is_fine() {
        let root = def("root", false, vec![write(var("x"), 1), write(var("x"), 2), write(field("y"), 3)]);
        assert!(check_var_field_conflicts(&pipeline(root, vec![])).is_empty());
    }

    #[test]
    fn test_conflict_through_inheriting_block() {
        let block = def("block_1", true, vec![write(field("total"), 3)]);
        let invoke = FieldMapping::output(ValueSource::call(FunctionCall::new(
            FunctionReference::qualified("test", "block_1"),
            vec![],
            Span::DUMMY,
        )));
        let root = def("root", false, vec![write(var("total"), 1), invoke]);
        let found = check_var_field_conflicts(&pipeline(root, vec![block]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].primary_span(), Some(Span::on_line(3, 1, 5)));
    }

    #[test]
    fn test_separate_frames_do_not_conflict() {
        let other = def("other", false, vec![write(field("total"), 3)]);
        let root = def("root", false, vec![write(var("total"), 1)]);
        assert!(check_var_field_conflicts(&pipeline(root, vec![other])).is_empty());
    }
}
