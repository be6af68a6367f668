//! Datasets, concurrent workers and cancellation.

use pretty_assertions::assert_eq;
use rayon::prelude::*;

use mapl_eval::{CancellationToken, EvalResult, Runtime, RuntimeContext, Signature, Value};
use mapl_transpile::syntax::{Expr, FunctionDef, InfixOp, Statement};

use crate::common::{load, program, root, run};

fn double() -> FunctionDef {
    FunctionDef::new(
        "double",
        &["n"],
        Expr::infix(InfixOp::Mul, Expr::var("n"), Expr::int(2)),
    )
}

#[test]
fn test_dataset_is_mapped_in_parallel() {
    // out: double($root.rows[])
    let program = program(
        vec![double()],
        vec![Statement::field(
            "out",
            Expr::call("double", vec![root("rows").iterated()]),
        )],
    );
    let rows = Value::dataset((0..500).map(Value::int).collect());
    let out = run(&program, Value::container([("rows", rows)])).unwrap();

    let Value::Dataset(results) = out.field("out") else {
        panic!("expected a dataset");
    };
    assert_eq!(results.len(), 500);
    for (i, result) in (0_i64..).zip(results.iter()) {
        assert_eq!(*result, Value::int(i * 2));
    }
}

#[test]
fn test_workers_share_one_runtime() {
    let runtime = Runtime::builder().build();
    let pipeline = load(
        &runtime,
        &program(
            vec![double()],
            vec![Statement::field("d", Expr::call("double", vec![root("n")]))],
        ),
    );

    let results: Vec<Value> = (0..64_i64)
        .into_par_iter()
        .map(|n| {
            runtime
                .context()
                .run(&pipeline, Value::container([("n", Value::int(n))]))
                .unwrap()
        })
        .collect();
    for (n, out) in (0_i64..).zip(&results) {
        assert_eq!(out.field("d"), Value::int(n * 2));
    }
}

fn stop(ctx: &mut RuntimeContext, _: &[Value]) -> EvalResult {
    ctx.runtime().cancellation().cancel();
    Ok(Value::Bool(true))
}

#[test]
fn test_cancellation_stops_later_calls() {
    let runtime = Runtime::builder().alias("host").build();
    runtime.register_native(Signature::new("host", "stop", vec![]), stop);
    let pipeline = load(
        &runtime,
        &program(
            vec![],
            vec![
                Statement::field("stopped", Expr::call("stop", vec![])),
                Statement::field("n", root("n")),
            ],
        ),
    );
    let err = runtime
        .context()
        .run(&pipeline, Value::container([("n", Value::int(1))]))
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(runtime.cancellation().is_cancelled());
}

#[test]
fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    let runtime = Runtime::builder().cancellation(token.clone()).build();
    let pipeline = load(&runtime, &program(vec![], vec![Statement::field("n", root("n"))]));
    token.cancel();
    let err = runtime.context().run(&pipeline, Value::Null).unwrap_err();
    assert!(err.is_cancelled());
}
