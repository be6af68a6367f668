#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use mapl_diagnostic::ErrorCode;
use mapl_ir::{
    DefinitionKind, FunctionCall, FunctionReference, PathSegment, SourceKind, Span, Target,
    ValueSource,
};

use super::*;
use crate::names::SeededNames;
use crate::signature::{ArgSpec, LambdaKind, Signature};
use crate::syntax::{CallExpr, Expr, InfixOp, PathStep, Statement};

fn program(functions: Vec<FunctionDef>, statements: Vec<Statement>) -> Program {
    Program {
        package: Some("demo".into()),
        functions,
        statements,
        span: Span::DUMMY,
    }
}

fn clean(program: &Program) -> TranspileOutput {
    let output = Transpiler::new().transpile_with_diagnostics(program).unwrap();
    assert_eq!(output.diagnostics, Vec::new());
    output
}

fn call_of(source: &ValueSource) -> &FunctionCall {
    source.as_call().unwrap()
}

fn locals(names: &[&str]) -> Vec<ValueSource> {
    names.iter().map(|n| ValueSource::local(*n, Span::DUMMY)).collect()
}

#[test]
fn test_root_definition() {
    let output = clean(&program(vec![], vec![Statement::field("out", Expr::int(1))]));
    let root = &output.pipeline.root;

    assert_eq!(root.name, "demo_root_function");
    assert_eq!(root.params, vec!["$root"]);
    assert_eq!(root.kind, DefinitionKind::Root);
    assert!(!root.inherit_parent_vars);
    assert_eq!(
        root.mappings[0].target,
        Target::Field {
            path: vec![PathSegment::Field("out".into())]
        }
    );
    assert_eq!(root.mappings[0].value, ValueSource::int(1, Span::DUMMY));
}

#[test]
fn test_default_package() {
    let output = Transpiler::new()
        .transpile_with_diagnostics(&Program::default())
        .unwrap();
    assert_eq!(output.pipeline.package, "$default");
    assert_eq!(output.pipeline.root.name, "$default_root_function");
}

#[test]
fn test_declared_function_expression_body() {
    let f = FunctionDef::new("double", &["n"], Expr::infix(InfixOp::Mul, Expr::var("n"), Expr::int(2)));
    let output = clean(&program(vec![f], vec![]));
    let def = output.pipeline.function("double").unwrap();

    assert_eq!(def.kind, DefinitionKind::Declared);
    assert_eq!(def.params, vec!["n"]);
    assert_eq!(def.mappings.len(), 1);
    assert_eq!(def.mappings[0].target, Target::Output);
    let call = call_of(&def.mappings[0].value);
    assert_eq!(call.reference, FunctionReference::builtin("mul"));
    assert!(!call.build_closure);
}

#[test]
fn test_lambda_captures_outer_variable() {
    // def g(x) { var y: 1; apply($ + x, y) } with `apply` taking a
    // one-parameter callback.
    let mut signatures = SignatureTable::builtins();
    signatures.register(
        FunctionReference::unqualified("apply"),
        Signature::of(vec![
            ArgSpec::closure(Signature::of(vec![ArgSpec::free("$")]), "apply_", LambdaKind::Explicit),
            ArgSpec::Value,
        ]),
    );
    let body = Expr::block(vec![
        Statement::var("y", Expr::int(1)),
        Statement::output(Expr::call(
            "apply",
            vec![Expr::infix(InfixOp::Add, Expr::var("$"), Expr::var("x")), Expr::var("y")],
        )),
    ]);
    let output = Transpiler::new()
        .with_signatures(signatures)
        .transpile_with_diagnostics(&program(vec![FunctionDef::new("g", &["x"], body)], vec![]))
        .unwrap();
    assert!(output.diagnostics.is_empty());

    let lambda = output.pipeline.function("apply_1").unwrap();
    assert_eq!(lambda.params, vec!["$", "x"]);
    assert_eq!(lambda.kind, DefinitionKind::Lambda);
    assert!(!lambda.inherit_parent_vars);

    let g = output.pipeline.function("g").unwrap();
    let apply = call_of(&g.mappings[1].value);
    assert_eq!(apply.reference, FunctionReference::unqualified("apply"));
    let closure = call_of(&apply.args[0]);
    assert!(closure.build_closure);
    assert_eq!(closure.reference, FunctionReference::qualified("demo", "apply_1"));
    assert_eq!(
        closure.args,
        vec![ValueSource::free("$", Span::DUMMY), ValueSource::local("x", Span::DUMMY)]
    );
    assert_eq!(apply.args[1], ValueSource::local("y", Span::DUMMY));
}

#[test]
fn test_variadic_placeholders() {
    let two = FunctionDef::new(
        "two",
        &["a", "b"],
        Expr::call(
            "iterate",
            vec![
                Expr::infix(InfixOp::Add, Expr::var("$1"), Expr::var("$2")),
                Expr::var("a"),
                Expr::var("b"),
            ],
        ),
    );
    let one = FunctionDef::new(
        "one",
        &["a"],
        Expr::call(
            "iterate",
            vec![Expr::infix(InfixOp::Mul, Expr::var("$"), Expr::int(2)), Expr::var("a")],
        ),
    );
    let output = clean(&program(vec![two, one], vec![]));

    assert_eq!(output.pipeline.function("iterate_1").unwrap().params, vec!["$1", "$2"]);
    assert_eq!(output.pipeline.function("iterate_2").unwrap().params, vec!["$"]);
}

#[test]
fn test_iterated_argument_desugars_to_iterate() {
    // def f(xs) sum(xs[], 1)
    let f = FunctionDef::new(
        "f",
        &["xs"],
        Expr::infix(InfixOp::Add, Expr::var("xs").iterated(), Expr::int(1)),
    );
    let output = clean(&program(vec![f], vec![]));
    let def = output.pipeline.function("f").unwrap();

    let iterate = call_of(&def.mappings[0].value);
    assert_eq!(iterate.reference, FunctionReference::builtin("iterate"));
    assert!(!iterate.build_closure);
    assert_eq!(iterate.args[1], ValueSource::local("xs", Span::DUMMY));

    let inner = call_of(&iterate.args[0]);
    assert!(inner.build_closure);
    assert_eq!(inner.reference, FunctionReference::builtin("sum"));
    assert_eq!(
        inner.args,
        vec![ValueSource::free("iteratedArg0", Span::DUMMY), ValueSource::int(1, Span::DUMMY)]
    );
}

#[test]
fn test_several_iterated_arguments_keep_order() {
    let f = FunctionDef::new(
        "f",
        &["a", "b"],
        Expr::call("zip", vec![Expr::var("a").iterated(), Expr::int(0), Expr::var("b").iterated()]),
    );
    let output = clean(&program(vec![f], vec![]));
    let iterate = call_of(&output.pipeline.function("f").unwrap().mappings[0].value);

    assert_eq!(&iterate.args[1..], &locals(&["a", "b"])[..]);
    let inner = call_of(&iterate.args[0]);
    assert_eq!(inner.free_parameter_count(), 2);
    assert_eq!(inner.args[0], ValueSource::free("iteratedArg0", Span::DUMMY));
    assert_eq!(inner.args[1], ValueSource::int(0, Span::DUMMY));
    assert_eq!(inner.args[2], ValueSource::free("iteratedArg2", Span::DUMMY));
}

#[test]
fn test_iterated_placeholder_uses_argument_position() {
    // def f(a, b) zip(a, b[])
    let f = FunctionDef::new(
        "f",
        &["a", "b"],
        Expr::call("zip", vec![Expr::var("a"), Expr::var("b").iterated()]),
    );
    let output = clean(&program(vec![f], vec![]));
    let iterate = call_of(&output.pipeline.function("f").unwrap().mappings[0].value);

    let inner = call_of(&iterate.args[0]);
    assert_eq!(
        inner.args,
        vec![ValueSource::local("a", Span::DUMMY), ValueSource::free("iteratedArg1", Span::DUMMY)]
    );
}

#[test]
fn test_iterated_statement_value() {
    let f = FunctionDef::new(
        "f",
        &["xs"],
        Expr::block(vec![Statement::field("items", Expr::var("xs").iterated())]),
    );
    let output = clean(&program(vec![f], vec![]));
    let mapping = &output.pipeline.function("f").unwrap().mappings[0];
    assert!(mapping.iterate_source);
    assert!(!mapping.value.iterate);
}

#[test]
fn test_block_lifting() {
    // def f(a) { out: { var t: a; t } }
    let block = Expr::block(vec![Statement::var("t", Expr::var("a")), Statement::output(Expr::var("t"))]);
    let f = FunctionDef::new("f", &["a"], Expr::block(vec![Statement::field("out", block)]));
    let output = clean(&program(vec![f], vec![]));

    let lifted = output.pipeline.function("block_1").unwrap();
    assert_eq!(lifted.kind, DefinitionKind::Block);
    assert!(lifted.inherit_parent_vars);
    assert_eq!(lifted.params, vec!["a"]);
    assert_eq!(output.captures["block_1"], vec!["a"]);

    let invoke = call_of(&output.pipeline.function("f").unwrap().mappings[0].value);
    assert!(!invoke.build_closure);
    assert_eq!(invoke.reference, FunctionReference::qualified("demo", "block_1"));
    assert_eq!(invoke.args, locals(&["a"]));
}

#[test]
fn test_nested_blocks_thread_captures() {
    // def f(a) { { { a } } }
    let inner = Expr::block(vec![Statement::output(Expr::var("a"))]);
    let outer = Expr::block(vec![Statement::output(inner)]);
    let f = FunctionDef::new("f", &["a"], Expr::block(vec![Statement::output(outer)]));
    let output = clean(&program(vec![f], vec![]));

    assert_eq!(output.pipeline.function("block_1").unwrap().params, vec!["a"]);
    assert_eq!(output.pipeline.function("block_2").unwrap().params, vec!["a"]);
    let outer_body = call_of(&output.pipeline.function("block_1").unwrap().mappings[0].value);
    assert_eq!(outer_body.args, locals(&["a"]));
}

#[test]
fn test_ternary_branches_are_lifted() {
    let f = FunctionDef::new(
        "f",
        &["c", "a", "b"],
        Expr::conditional(Expr::var("c"), Expr::var("a"), Some(Expr::var("b"))),
    );
    let output = clean(&program(vec![f], vec![]));
    let ternary = call_of(&output.pipeline.function("f").unwrap().mappings[0].value);

    assert_eq!(ternary.reference, FunctionReference::builtin("ternary"));
    assert_eq!(ternary.args[0], ValueSource::local("c", Span::DUMMY));
    let then = output.pipeline.function("ternary-then_1").unwrap();
    let otherwise = output.pipeline.function("ternary-else_2").unwrap();
    assert!(then.inherit_parent_vars);
    assert_eq!(then.params, vec!["a"]);
    assert_eq!(otherwise.params, vec!["b"]);
    assert!(call_of(&ternary.args[1]).build_closure);
}

#[test]
fn test_path_reads() {
    // $root.items[0]
    let read = Expr::path(
        Expr::var("$root"),
        vec![PathStep::Field("items".into()), PathStep::Index(0)],
    );
    let output = clean(&program(vec![], vec![Statement::field("first", read)]));

    let outer = call_of(&output.pipeline.root.mappings[0].value);
    assert_eq!(outer.reference, FunctionReference::builtin("get"));
    assert_eq!(outer.args[1], ValueSource::int(0, Span::DUMMY));
    let inner = call_of(&outer.args[0]);
    assert_eq!(
        inner.args,
        vec![ValueSource::local("$root", Span::DUMMY), ValueSource::string("items", Span::DUMMY)]
    );
}

#[test]
fn test_path_selector_is_wildcard_call() {
    // $root.items[where $ > 1]
    let read = Expr::path(
        Expr::var("$root"),
        vec![
            PathStep::Field("items".into()),
            PathStep::Select(CallExpr {
                package: None,
                name: "where".into(),
                args: vec![Expr::infix(InfixOp::Gt, Expr::var("$"), Expr::int(1))],
            }),
        ],
    );
    let output = clean(&program(vec![], vec![Statement::field("big", read)]));

    let select = call_of(&output.pipeline.root.mappings[0].value);
    assert!(select.reference.is_wildcard());
    assert_eq!(select.reference.name, "where");
    assert_eq!(output.pipeline.function("selector-where_1").unwrap().params, vec!["$"]);
}

#[test]
fn test_undeclared_variable_tolerant() {
    let output = Transpiler::new()
        .transpile_with_diagnostics(&program(vec![], vec![Statement::field("x", Expr::var("missing"))]))
        .unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1001);
    // Auto-declared at the top and passed in like any other capture.
    assert_eq!(output.pipeline.root.params, vec!["$root", "missing"]);
}

#[test]
fn test_transpile_fails_with_collected_issues() {
    let statements = vec![
        Statement::field("x", Expr::var("missing")).at(Span::on_line(2, 1, 10)),
        Statement::field("y", Expr::var("other")).at(Span::on_line(1, 1, 10)),
    ];
    let err = Transpiler::new().transpile(&program(vec![], statements)).unwrap_err();
    let TranspileError::Issues(issues) = &err else {
        panic!("expected collected issues, got {err:?}");
    };
    assert_eq!(issues.len(), 2);
    assert_eq!(err.diagnostics().len(), 2);
}

#[test]
fn test_strict_mode_stops_at_first_issue() {
    let err = Transpiler::new()
        .with_mode(CompileMode::Strict)
        .transpile(&program(vec![], vec![Statement::field("x", Expr::var("missing"))]))
        .unwrap_err();
    let TranspileError::Strict(diagnostic) = err else {
        panic!("expected strict failure");
    };
    assert_eq!(diagnostic.code, ErrorCode::E1001);
}

#[test]
fn test_too_many_arguments() {
    let call = Expr::call("where", vec![Expr::var("$root"), Expr::bool(true), Expr::int(3)]);
    let output = Transpiler::new()
        .transpile_with_diagnostics(&program(vec![], vec![Statement::output(call)]))
        .unwrap();
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E2001);
}

#[test]
fn test_blank_variable_name() {
    let output = Transpiler::new()
        .transpile_with_diagnostics(&program(vec![], vec![Statement::var(" ", Expr::int(1))]))
        .unwrap();
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1003);
}

#[test]
fn test_var_field_conflict_reported() {
    let statements = vec![
        Statement::var("total", Expr::int(1)).at(Span::on_line(1, 1, 12)),
        Statement::field("total", Expr::var("total")).at(Span::on_line(2, 1, 14)),
    ];
    let output = Transpiler::new()
        .transpile_with_diagnostics(&program(vec![], statements))
        .unwrap();
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code, ErrorCode::E1002);
}

#[test]
fn test_seeded_names_are_reproducible() {
    let block = Expr::block(vec![Statement::output(Expr::var("$root"))]);
    let source = program(vec![], vec![Statement::field("b", block)]);

    let first = Transpiler::new()
        .with_names(SeededNames::new(99))
        .transpile(&source)
        .unwrap();
    let second = Transpiler::new()
        .with_names(SeededNames::new(99))
        .transpile(&source)
        .unwrap();
    assert_eq!(first, second);
    assert!(first.functions[0].name.starts_with("block_"));
}

#[test]
fn test_deep_nesting() {
    let mut expr = Expr::var("$root");
    for _ in 0..2_000 {
        expr = Expr::infix(InfixOp::Add, expr, Expr::int(1));
    }
    let output = clean(&program(vec![], vec![Statement::field("deep", expr)]));
    assert!(matches!(
        output.pipeline.root.mappings[0].value.kind,
        SourceKind::FunctionCall(_)
    ));
}

#[test]
fn test_config_package_applies_when_program_has_none() {
    let config = TranspileConfig {
        mode: CompileMode::Strict,
        package: Some("orders".into()),
    };
    let pipeline = Transpiler::with_config(config)
        .transpile(&Program::default())
        .unwrap();
    assert_eq!(pipeline.package, "orders");
    assert_eq!(pipeline.root.name, "orders_root_function");
}

#[test]
fn test_qualified_call_ignores_selector_signature() {
    // def where(a, b) a; out: demo::where($root, $root)
    let own = FunctionDef::new("where", &["a", "b"], Expr::var("a"));
    let call = Expr::qualified_call("demo", "where", vec![Expr::var("$root"), Expr::var("$root")]);
    let output = clean(&program(vec![own], vec![Statement::field("out", call)]));

    let call = call_of(&output.pipeline.root.mappings[0].value);
    assert_eq!(call.reference, FunctionReference::qualified("demo", "where"));
    assert_eq!(call.args, locals(&["$root", "$root"]));
    assert!(output.pipeline.functions.iter().all(|def| def.kind == DefinitionKind::Declared));
}

#[test]
fn test_sort_predicate_is_lifted() {
    // out: $root.items[sortBy $.age]
    let read = Expr::path(
        Expr::var("$root"),
        vec![
            PathStep::Field("items".into()),
            PathStep::Select(CallExpr {
                package: None,
                name: "sortBy".into(),
                args: vec![Expr::path(Expr::var("$"), vec![PathStep::Field("age".into())])],
            }),
        ],
    );
    let output = clean(&program(vec![], vec![Statement::field("out", read)]));

    assert_eq!(output.pipeline.root.params, vec!["$root"]);
    let lifted = output.pipeline.function("selector-sortby_1").unwrap();
    assert_eq!(lifted.params, vec!["$"]);
    assert!(!lifted.inherit_parent_vars);

    let sort = call_of(&output.pipeline.root.mappings[0].value);
    assert_eq!(sort.reference, FunctionReference::wildcard("sortBy"));
    let predicate = call_of(&sort.args[1]);
    assert!(predicate.build_closure);
    assert_eq!(predicate.args, vec![ValueSource::free("$", Span::DUMMY)]);
}

#[test]
fn test_join_predicate_takes_left_and_right() {
    // def pair(xs, ys) join(xs, ys, $left == $right)
    let body = Expr::call(
        "join",
        vec![
            Expr::var("xs"),
            Expr::var("ys"),
            Expr::infix(InfixOp::Eq, Expr::var("$left"), Expr::var("$right")),
        ],
    );
    let output = clean(&program(vec![FunctionDef::new("pair", &["xs", "ys"], body)], vec![]));
    assert_eq!(
        output.pipeline.function("selector-join_1").unwrap().params,
        vec!["$left", "$right"]
    );
}
