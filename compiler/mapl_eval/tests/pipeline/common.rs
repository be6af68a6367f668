//! Shared helpers for pipeline tests.

use std::sync::Arc;

use mapl_eval::{init_tracing, EvalResult, Runtime, Value};
use mapl_ir::{PipelineConfig, Span};
use mapl_transpile::syntax::{Expr, FunctionDef, PathStep, Program, Statement};
use mapl_transpile::{CompileMode, Transpiler};

/// Program in the `demo` package.
pub fn program(functions: Vec<FunctionDef>, statements: Vec<Statement>) -> Program {
    Program {
        package: Some("demo".into()),
        functions,
        statements,
        span: Span::DUMMY,
    }
}

/// Transpile strictly and register the result with `runtime`.
///
/// Set `RUST_LOG=mapl_eval=debug` to see the calls a test makes.
pub fn load(runtime: &Arc<Runtime>, program: &Program) -> PipelineConfig {
    init_tracing();
    let pipeline = Transpiler::new()
        .with_mode(CompileMode::Strict)
        .transpile(program)
        .expect("program should transpile");
    runtime.load_pipeline(&pipeline);
    pipeline
}

/// Run `program` on `input` with a fresh runtime holding only the builtins.
pub fn run(program: &Program, input: Value) -> EvalResult {
    let runtime = Runtime::builder().build();
    let pipeline = load(&runtime, program);
    runtime.context().run(&pipeline, input)
}

/// `$root.a.b...`
pub fn root(path: &str) -> Expr {
    Expr::path(
        Expr::var("$root"),
        path.split('.').map(|field| PathStep::Field(field.into())).collect(),
    )
}

pub fn ints(items: &[i64]) -> Value {
    Value::array(items.iter().copied().map(Value::int).collect())
}
