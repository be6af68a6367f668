//! Compile-time call signatures.
//!
//! A [`Signature`] tells the transpiler how to turn each call-site argument
//! into IR: transpile it in place ([`ArgSpec::Value`]), lift it into a
//! standalone closure ([`ArgSpec::Closure`]), or replace it with a free
//! parameter placeholder ([`ArgSpec::Free`]).

use rustc_hash::FxHashMap;

use mapl_ir::{FunctionReference, BUILTINS_PACKAGE};

/// How a lifted closure sees its caller's variables at runtime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LambdaKind {
    /// `{ ... }` body: reads and writes fall through to the caller's frame.
    Block,
    /// Operand wrapped only to defer evaluation (ternary branches, `and`/`or`).
    Implicit,
    /// A user-visible callback (selectors, iteration bodies).
    Explicit,
}

impl LambdaKind {
    /// Whether the generated definition inherits its caller's variables.
    #[inline]
    pub fn inherits_parent_vars(self) -> bool {
        matches!(self, LambdaKind::Block | LambdaKind::Implicit)
    }
}

/// Expected form of the callback passed at a closure position.
#[derive(Clone, PartialEq, Debug)]
pub struct ClosureSpec {
    pub signature: Signature,
    /// Prefix of the generated definition's name.
    pub prefix: String,
    pub kind: LambdaKind,
}

impl ClosureSpec {
    /// Free parameter names of the lifted closure when `remaining` call-site
    /// arguments follow it.
    ///
    /// A variadic closure signature synthesizes one free parameter per
    /// remaining argument: `$` if exactly one, else `$1..$N`. Otherwise the
    /// closure signature's own free parameters are used, in order.
    pub fn free_parameter_names(&self, remaining: usize) -> Vec<String> {
        if self.signature.is_variadic() {
            return match remaining {
                1 => vec!["$".to_string()],
                n => (1..=n).map(|i| format!("${i}")).collect(),
            };
        }
        self.signature
            .args()
            .iter()
            .filter_map(|arg| match arg {
                ArgSpec::Free(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// One parameter of a [`Signature`].
#[derive(Clone, PartialEq, Debug)]
pub enum ArgSpec {
    Value,
    Closure(Box<ClosureSpec>),
    Free(String),
}

impl ArgSpec {
    pub fn closure(signature: Signature, prefix: impl Into<String>, kind: LambdaKind) -> Self {
        ArgSpec::Closure(Box::new(ClosureSpec {
            signature,
            prefix: prefix.into(),
            kind,
        }))
    }

    pub fn free(name: impl Into<String>) -> Self {
        ArgSpec::Free(name.into())
    }
}

/// Ordered parameter forms plus variadic flag.
#[derive(Clone, PartialEq, Debug)]
pub struct Signature {
    args: Vec<ArgSpec>,
    variadic: bool,
}

impl Signature {
    pub fn of(args: Vec<ArgSpec>) -> Self {
        Signature {
            args,
            variadic: false,
        }
    }

    /// Signature whose last parameter repeats.
    pub fn variadic(args: Vec<ArgSpec>) -> Self {
        Signature {
            args,
            variadic: true,
        }
    }

    /// Any number of plain values. Used for functions without a known signature.
    pub fn any() -> Self {
        Self::variadic(vec![ArgSpec::Value])
    }

    /// `iterate`-style signature: a callback taking one free parameter per
    /// following argument, then the arguments themselves.
    pub fn synchronized(prefix: &str) -> Self {
        Self::variadic(vec![
            ArgSpec::closure(
                Self::variadic(vec![ArgSpec::free("$")]),
                prefix,
                LambdaKind::Explicit,
            ),
            ArgSpec::Value,
        ])
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Whether a call with `count` arguments fits. A variadic slot may be empty.
    pub fn accepts(&self, count: usize) -> bool {
        count == self.args.len() || (self.variadic && count + 1 >= self.args.len())
    }

    /// Form of the argument at `index`; positions past the end reuse the last.
    pub fn spec_at(&self, index: usize) -> Option<&ArgSpec> {
        self.args.get(index).or_else(|| self.args.last())
    }
}

/// Signatures known to the transpiler, keyed by function reference.
///
/// Builtins are registered under `builtins` and also unqualified, since they
/// can be called without a package. Selectors live under the `*` wildcard:
/// an unqualified lookup that misses falls back to it. A reference into any
/// other package only sees signatures registered for that package.
#[derive(Clone, Debug, Default)]
pub struct SignatureTable {
    entries: FxHashMap<FunctionReference, Vec<Signature>>,
}

impl SignatureTable {
    /// Empty table: every call transpiles its arguments as plain values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the signatures of the core builtins and selectors.
    pub fn builtins() -> Self {
        let mut table = Self::new();
        let then = || ArgSpec::closure(Signature::of(vec![]), "ternary-then_", LambdaKind::Implicit);
        let otherwise =
            || ArgSpec::closure(Signature::of(vec![]), "ternary-else_", LambdaKind::Implicit);
        let ternary = FunctionReference::builtin("ternary");
        table.register(
            ternary.clone(),
            Signature::of(vec![ArgSpec::Value, then(), otherwise()]),
        );
        table.register(ternary, Signature::of(vec![ArgSpec::Value, then()]));

        table.register(
            FunctionReference::builtin("iterate"),
            Signature::synchronized("iterate_"),
        );
        table.register(
            FunctionReference::builtin("arrayOf"),
            Signature::variadic(vec![ArgSpec::Value]),
        );
        table.register(
            FunctionReference::builtin("extractRegex"),
            Signature::of(vec![
                ArgSpec::Value,
                ArgSpec::Value,
                ArgSpec::closure(
                    Signature::of(vec![ArgSpec::free("$")]),
                    "lambda_",
                    LambdaKind::Explicit,
                ),
            ]),
        );

        for op in ["and", "or"] {
            table.register(
                FunctionReference::builtin(op),
                Signature::variadic(vec![ArgSpec::closure(
                    Signature::of(vec![]),
                    format!("infix-operator-{op}_"),
                    LambdaKind::Implicit,
                )]),
            );
        }

        for (name, prefix) in [
            ("where", "where"),
            ("sortBy", "sortby"),
            ("sortByDescending", "sortbydesc"),
            ("groupBy", "groupby"),
            ("uniqueBy", "uniqueBy"),
        ] {
            table.register(
                FunctionReference::wildcard(name),
                Signature::of(vec![ArgSpec::Value, selector(prefix, &["$"])]),
            );
        }
        table.register(
            FunctionReference::wildcard("last"),
            Signature::of(vec![ArgSpec::Value]),
        );

        let reduce = FunctionReference::wildcard("reduce");
        table.register(
            reduce.clone(),
            Signature::of(vec![ArgSpec::Value, selector("accumulator", &["$acc", "$cur"])]),
        );
        table.register(
            reduce,
            Signature::of(vec![
                ArgSpec::Value,
                ArgSpec::Value,
                selector("accumulator", &["$acc", "$cur"]),
            ]),
        );
        table.register(
            FunctionReference::wildcard("join"),
            Signature::of(vec![
                ArgSpec::Value,
                ArgSpec::Value,
                selector("join", &["$left", "$right"]),
            ]),
        );
        table
    }

    /// Add an overload. Earlier registrations win when several accept a call.
    pub fn register(&mut self, reference: FunctionReference, signature: Signature) {
        if reference.package.as_deref() == Some(BUILTINS_PACKAGE) {
            self.entries
                .entry(FunctionReference::unqualified(reference.name.clone()))
                .or_default()
                .push(signature.clone());
        }
        self.entries.entry(reference).or_default().push(signature);
    }

    /// Signature for a call of `reference` with `count` arguments.
    ///
    /// Falls back to the first registered overload when none fits the count
    /// (so that the arity error can be reported), and to [`Signature::any`]
    /// for unknown references.
    pub fn lookup(&self, reference: &FunctionReference, count: usize) -> Signature {
        let overloads = self.entries.get(reference).or_else(|| {
            reference
                .package
                .is_none()
                .then(|| self.entries.get(&FunctionReference::wildcard(reference.name.clone())))
                .flatten()
        });
        match overloads {
            Some(overloads) => overloads
                .iter()
                .find(|s| s.accepts(count))
                .or_else(|| overloads.first())
                .cloned()
                .unwrap_or_else(Signature::any),
            None => Signature::any(),
        }
    }
}

/// Callback argument of a selector, lifted as `selector-<name>_<id>`.
fn selector(name: &str, free: &[&str]) -> ArgSpec {
    ArgSpec::closure(
        Signature::of(free.iter().copied().map(ArgSpec::free).collect()),
        format!("selector-{name}_"),
        LambdaKind::Explicit,
    )
}
