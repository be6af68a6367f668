//! Overload selection and lookup failures as seen from programs.

use pretty_assertions::assert_eq;

use mapl_eval::{
    ArgType, Capability, EvalErrorKind, EvalResult, Kind, Runtime, RuntimeContext, Signature,
    Value,
};
use mapl_transpile::syntax::{Expr, FunctionDef, InfixOp, Statement};

use crate::common::{load, program, run};

const NUMBER: ArgType = ArgType::Exact(Kind::Number);
const STRING: ArgType = ArgType::Exact(Kind::String);
const PRIMITIVE: ArgType = ArgType::Capability(Capability::Primitive);

fn first(_: &mut RuntimeContext, args: &[Value]) -> EvalResult {
    Ok(args[0].clone())
}

fn describe_string(_: &mut RuntimeContext, _: &[Value]) -> EvalResult {
    Ok(Value::string("string"))
}

fn describe_any(_: &mut RuntimeContext, _: &[Value]) -> EvalResult {
    Ok(Value::string("any"))
}

/// Runtime that also searches the `host` package for unqualified names.
fn host_runtime() -> std::sync::Arc<Runtime> {
    let runtime = Runtime::builder().alias("host").build();
    runtime.register_native(Signature::new("host", "pick", vec![NUMBER, PRIMITIVE]), first);
    runtime.register_native(Signature::new("host", "pick", vec![PRIMITIVE, NUMBER]), first);
    runtime.register_native(Signature::new("host", "describe", vec![STRING]), describe_string);
    runtime.register_native(Signature::new("host", "describe", vec![ArgType::Any]), describe_any);
    runtime
}

fn run_on_host(statements: Vec<Statement>) -> EvalResult {
    let runtime = host_runtime();
    let pipeline = load(&runtime, &program(vec![], statements));
    runtime.context().run(&pipeline, Value::Null)
}

#[test]
fn test_closest_overload_wins() {
    let out = run_on_host(vec![
        Statement::field("s", Expr::call("describe", vec![Expr::str("x")])),
        Statement::field("n", Expr::call("describe", vec![Expr::int(1)])),
        Statement::field("p", Expr::call("pick", vec![Expr::int(1), Expr::str("a")])),
    ])
    .unwrap();
    assert_eq!(
        out,
        Value::container([
            ("s", Value::string("string")),
            ("n", Value::string("any")),
            ("p", Value::int(1)),
        ])
    );
}

#[test]
fn test_tied_overloads_are_ambiguous() {
    let err = run_on_host(vec![Statement::field(
        "p",
        Expr::call("pick", vec![Expr::int(1), Expr::int(2)]),
    )])
    .unwrap_err();
    let EvalErrorKind::AmbiguousOverload { function, candidates } = &err.kind else {
        panic!("expected an ambiguity, got {}", err.kind);
    };
    assert_eq!(function.as_str(), "pick");
    assert_eq!(candidates.len(), 2);
}

#[test]
fn test_unknown_function_suggests_declared_one() {
    let double = FunctionDef::new(
        "double",
        &["n"],
        Expr::infix(InfixOp::Mul, Expr::var("n"), Expr::int(2)),
    );
    let program = program(
        vec![double],
        vec![Statement::field("d", Expr::call("dobule", vec![Expr::int(1)]))],
    );
    let err = run(&program, Value::Null).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::NoMatchingFunction {
            reference: "dobule".into(),
            suggestions: vec!["demo::double()".into()],
        }
    );
    let backtrace = err.backtrace.unwrap();
    assert_eq!(backtrace.frames()[0].name, "demo::demo_root_function");
}

#[test]
fn test_wrong_argument_count_for_declared_function() {
    let double = FunctionDef::new(
        "double",
        &["n"],
        Expr::infix(InfixOp::Mul, Expr::var("n"), Expr::int(2)),
    );
    let program = program(
        vec![double],
        vec![Statement::field(
            "d",
            Expr::call("double", vec![Expr::int(1), Expr::int(2)]),
        )],
    );
    let err = run(&program, Value::Null).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NoMatchingOverload { .. }));
}
