//! Syntax tree consumed by the transpiler.
//!
//! This is the contract with the grammar layer: a parser produces these
//! nodes, the [`Transpiler`](crate::Transpiler) walks them depth-first.
//! Spans carry line/column positions that end up in diagnostics.
//!
//! The small constructor helpers exist so that hosts (and tests) can build
//! trees without a parser.

use mapl_ir::{PathSegment, Span};

/// A whole source unit.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    pub package: Option<String>,
    pub functions: Vec<FunctionDef>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// `def name(params) body`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    /// A block body is inlined into the definition; any other expression
    /// becomes its single output mapping.
    pub body: Expr,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

/// `target: value`, or a bare `value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub target: Option<TargetExpr>,
    pub value: Expr,
    pub span: Span,
}

/// Left-hand side of a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetExpr {
    /// `var name.path: ...`
    Var { name: String, path: Vec<PathSegment> },
    /// `field.path: ...`
    Field { path: Vec<PathSegment> },
}

/// `{ statements }`
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Trailing `[]`: broadcast this expression over the enclosing call.
    pub iterate: bool,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
}

impl InfixOp {
    /// Name of the builtin implementing the operator.
    pub fn builtin_name(self) -> &'static str {
        match self {
            InfixOp::Add => "sum",
            InfixOp::Sub => "sub",
            InfixOp::Mul => "mul",
            InfixOp::Div => "div",
            InfixOp::Eq => "eq",
            InfixOp::NotEq => "neq",
            InfixOp::Gt => "gt",
            InfixOp::Lt => "lt",
            InfixOp::GtEq => "gtEq",
            InfixOp::LtEq => "ltEq",
            InfixOp::And => "and",
            InfixOp::Or => "or",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!x`
    Not,
    /// `x?`
    IsNotNil,
}

impl UnaryOp {
    pub fn builtin_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::IsNotNil => "isNotNil",
        }
    }
}

/// `name(args)` or `pkg::name(args)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub package: Option<String>,
    pub name: String,
    pub args: Vec<Expr>,
}

/// One step of a path read.
#[derive(Clone, Debug, PartialEq)]
pub enum PathStep {
    /// `.name`
    Field(String),
    /// `[3]`
    Index(i64),
    /// `[where $.x > 1]`: the selectee is passed as the first argument.
    Select(CallExpr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Var(String),
    Path {
        base: Box<Expr>,
        steps: Vec<PathStep>,
    },
    Call(CallExpr),
    Infix {
        op: InfixOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `if cond then a else b`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Block(Block),
    Array(Vec<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            iterate: false,
            span: Span::DUMMY,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Str(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Bool(value))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Var(name.into()))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(CallExpr {
            package: None,
            name: name.into(),
            args,
        }))
    }

    pub fn qualified_call(
        package: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::new(ExprKind::Call(CallExpr {
            package: Some(package.into()),
            name: name.into(),
            args,
        }))
    }

    pub fn infix(op: InfixOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Infix {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn conditional(cond: Expr, then: Expr, otherwise: Option<Expr>) -> Self {
        Self::new(ExprKind::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        })
    }

    pub fn block(statements: Vec<Statement>) -> Self {
        Self::new(ExprKind::Block(Block {
            statements,
            span: Span::DUMMY,
        }))
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(items))
    }

    pub fn path(base: Expr, steps: Vec<PathStep>) -> Self {
        Self::new(ExprKind::Path {
            base: Box::new(base),
            steps,
        })
    }

    /// Mark this expression as broadcast (`expr[]`).
    #[must_use]
    pub fn iterated(mut self) -> Self {
        self.iterate = true;
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        if let ExprKind::Block(block) = &mut self.kind {
            block.span = span;
        }
        self
    }
}

impl Statement {
    /// `var name: value`
    pub fn var(name: impl Into<String>, value: Expr) -> Self {
        Statement {
            target: Some(TargetExpr::Var {
                name: name.into(),
                path: Vec::new(),
            }),
            span: value.span,
            value,
        }
    }

    /// `a.b: value`
    pub fn field(path: &str, value: Expr) -> Self {
        Statement {
            target: Some(TargetExpr::Field {
                path: path
                    .split('.')
                    .map(|segment| PathSegment::Field(segment.to_string()))
                    .collect(),
            }),
            span: value.span,
            value,
        }
    }

    /// Bare expression statement.
    pub fn output(value: Expr) -> Self {
        Statement {
            target: None,
            span: value.span,
            value,
        }
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, params: &[&str], body: Expr) -> Self {
        FunctionDef {
            name: name.into(),
            params: params
                .iter()
                .map(|p| Param {
                    name: (*p).to_string(),
                    span: Span::DUMMY,
                })
                .collect(),
            body,
            span: Span::DUMMY,
        }
    }
}
