//! Fields, variables, blocks, lambdas and broadcasting.

use pretty_assertions::assert_eq;

use mapl_eval::Value;
use mapl_ir::{PathSegment, Span};
use mapl_transpile::syntax::{
    CallExpr, Expr, FunctionDef, InfixOp, PathStep, Statement, TargetExpr,
};

use crate::common::{ints, program, root, run};

#[test]
fn test_fields_from_input() {
    let program = program(
        vec![],
        vec![
            Statement::field("name", root("name")),
            Statement::field("total", Expr::infix(InfixOp::Add, root("a"), root("b"))),
            Statement::field("nested.copy", root("a")),
        ],
    );
    let input = Value::container([
        ("name", Value::string("x")),
        ("a", Value::int(1)),
        ("b", Value::int(2)),
    ]);
    assert_eq!(
        run(&program, input).unwrap(),
        Value::container([
            ("name", Value::string("x")),
            ("total", Value::int(3)),
            ("nested", Value::container([("copy", Value::int(1))])),
        ])
    );
}

#[test]
fn test_missing_input_fields_are_skipped() {
    let program = program(vec![], vec![Statement::field("name", root("name"))]);
    let out = run(&program, Value::container([("other", Value::int(1))])).unwrap();
    assert!(!out
        .as_container()
        .is_some_and(|fields| fields.contains_key("name")));
}

#[test]
fn test_variables_feed_fields() {
    let program = program(
        vec![],
        vec![
            Statement::var("t", Expr::infix(InfixOp::Mul, root("a"), Expr::int(10))),
            Statement::field("scaled", Expr::var("t")),
        ],
    );
    let out = run(&program, Value::container([("a", Value::int(2))])).unwrap();
    assert_eq!(out, Value::container([("scaled", Value::int(20))]));
}

#[test]
fn test_where_lambda_captures_variable() {
    // var limit: 1; big: $root.items[where $ > limit]
    let select = Expr::path(
        Expr::var("$root"),
        vec![
            PathStep::Field("items".into()),
            PathStep::Select(CallExpr {
                package: None,
                name: "where".into(),
                args: vec![Expr::infix(InfixOp::Gt, Expr::var("$"), Expr::var("limit"))],
            }),
        ],
    );
    let program = program(
        vec![],
        vec![
            Statement::var("limit", Expr::int(1)),
            Statement::field("big", select),
        ],
    );
    let out = run(&program, Value::container([("items", ints(&[1, 2, 3]))])).unwrap();
    assert_eq!(out.field("big"), ints(&[2, 3]));
}

#[test]
fn test_sort_by_selector() {
    // oldest: $root.people[sortByDescending $.age]
    let select = Expr::path(
        Expr::var("$root"),
        vec![
            PathStep::Field("people".into()),
            PathStep::Select(CallExpr {
                package: None,
                name: "sortByDescending".into(),
                args: vec![Expr::path(Expr::var("$"), vec![PathStep::Field("age".into())])],
            }),
        ],
    );
    let program = program(vec![], vec![Statement::field("oldest", select)]);
    let person = |age| Value::container([("age", Value::int(age))]);
    let input = Value::container([(
        "people",
        Value::array(vec![person(20), person(50), person(35)]),
    )]);
    let out = run(&program, input).unwrap();
    assert_eq!(
        out.field("oldest"),
        Value::array(vec![person(50), person(35), person(20)])
    );
}

#[test]
fn test_broadcast_over_array() {
    // doubled: $root.items[] * 2
    let program = program(
        vec![],
        vec![Statement::field(
            "doubled",
            Expr::infix(InfixOp::Mul, root("items").iterated(), Expr::int(2)),
        )],
    );
    let out = run(&program, Value::container([("items", ints(&[1, 2, 3]))])).unwrap();
    assert_eq!(out.field("doubled"), ints(&[2, 4, 6]));

    // Nothing to broadcast over: the field is not written.
    let out = run(&program, Value::container([("items", ints(&[]))])).unwrap();
    assert!(out.field("doubled").is_null_or_empty());
}

#[test]
fn test_broadcast_zips_two_arrays() {
    // sums: $root.a[] + $root.b[]
    let program = program(
        vec![],
        vec![Statement::field(
            "sums",
            Expr::infix(InfixOp::Add, root("a").iterated(), root("b").iterated()),
        )],
    );
    let input = Value::container([("a", ints(&[1, 2])), ("b", ints(&[10, 20]))]);
    assert_eq!(run(&program, input).unwrap().field("sums"), ints(&[11, 22]));
}

#[test]
fn test_conditional() {
    let size = Expr::conditional(
        Expr::infix(InfixOp::Gt, root("n"), Expr::int(2)),
        Expr::str("big"),
        Some(Expr::str("small")),
    );
    let program = program(vec![], vec![Statement::field("size", size)]);

    let big = run(&program, Value::container([("n", Value::int(5))])).unwrap();
    assert_eq!(big.field("size"), Value::string("big"));
    let small = run(&program, Value::container([("n", Value::int(1))])).unwrap();
    assert_eq!(small.field("size"), Value::string("small"));
}

#[test]
fn test_block_value_and_outer_writes() {
    // var count: 1
    // { var count: count + 5 }
    // total: count
    // out: { var t: $root.a; t + 1 }
    let bump = Expr::block(vec![Statement::var(
        "count",
        Expr::infix(InfixOp::Add, Expr::var("count"), Expr::int(5)),
    )]);
    let value = Expr::block(vec![
        Statement::var("t", root("a")),
        Statement::output(Expr::infix(InfixOp::Add, Expr::var("t"), Expr::int(1))),
    ]);
    let program = program(
        vec![],
        vec![
            Statement::var("count", Expr::int(1)),
            Statement::output(bump),
            Statement::field("total", Expr::var("count")),
            Statement::field("out", value),
        ],
    );
    let out = run(&program, Value::container([("a", Value::int(4))])).unwrap();
    assert_eq!(
        out,
        Value::container([("total", Value::int(6)), ("out", Value::int(5))])
    );
}

#[test]
fn test_declared_function_call() {
    let double = FunctionDef::new(
        "double",
        &["n"],
        Expr::infix(InfixOp::Mul, Expr::var("n"), Expr::int(2)),
    );
    let program = program(
        vec![double],
        vec![Statement::field("d", Expr::call("double", vec![root("a")]))],
    );
    let out = run(&program, Value::container([("a", Value::int(21))])).unwrap();
    assert_eq!(out.field("d"), Value::int(42));
}

#[test]
fn test_iterated_statement_appends_each_element() {
    // all[]: $root.items[]
    let append = Statement {
        target: Some(TargetExpr::Field {
            path: vec![PathSegment::Field("all".into()), PathSegment::Append],
        }),
        value: root("items").iterated(),
        span: Span::DUMMY,
    };
    let program = program(vec![], vec![append]);
    let items = Value::array(vec![Value::int(1), Value::Null, Value::string("x")]);
    let out = run(&program, Value::container([("items", items)])).unwrap();
    assert_eq!(
        out.field("all"),
        Value::array(vec![Value::int(1), Value::string("x")])
    );
}
