//! Callable functions and their runtime signatures.

use std::fmt;

use crate::context::RuntimeContext;
use crate::dispatch::normalize_args;
use crate::errors::EvalResult;
use crate::value::{Capability, Kind, Value};

/// Declared type of one parameter, as seen by overload dispatch.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ArgType {
    /// Exactly this kind (or, for [`Kind::Null`], any null or empty value).
    Exact(Kind),
    /// Any value with this capability.
    Capability(Capability),
    /// Anything at all.
    Any,
}

impl ArgType {
    /// Whether arrays are themselves the intended element of a variadic slot
    /// of this type, so a single array argument must not be unpacked.
    pub fn targets_arrays(self) -> bool {
        matches!(
            self,
            ArgType::Exact(Kind::Null | Kind::Array) | ArgType::Capability(Capability::Array)
        )
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Exact(kind) => write!(f, "{kind}"),
            ArgType::Capability(capability) => write!(f, "{capability}"),
            ArgType::Any => f.write_str("any"),
        }
    }
}

/// Runtime signature: where a function lives and what it accepts.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Signature {
    pub package: String,
    pub name: String,
    pub args: Vec<ArgType>,
    /// The last argument type repeats (zero or more times).
    pub variadic: bool,
    /// Calls to this function read and write through their caller's frame.
    pub inherits_parent_vars: bool,
}

impl Signature {
    pub fn new(package: impl Into<String>, name: impl Into<String>, args: Vec<ArgType>) -> Self {
        Signature {
            package: package.into(),
            name: name.into(),
            args,
            variadic: false,
            inherits_parent_vars: false,
        }
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn inheriting(mut self, inherits: bool) -> Self {
        self.inherits_parent_vars = inherits;
        self
    }

    /// `package::name`.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.package, self.name)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.package, self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
            if self.variadic && i + 1 == self.args.len() {
                f.write_str("...")?;
            }
        }
        f.write_str(")")
    }
}

/// A function the runtime can dispatch to.
///
/// Implementations are shared across workers and must not keep per-call
/// state; variables live in the [`RuntimeContext`] frames.
pub trait CallableFunction: Send + Sync + fmt::Debug {
    fn signature(&self) -> &Signature;

    /// Run the function. The caller has already pushed a frame for this
    /// call; go through [`RuntimeContext::call`] rather than calling this
    /// directly.
    fn call(&self, ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult;
}

/// Host function pointer.
pub type NativeFn = fn(&mut RuntimeContext, &[Value]) -> EvalResult;

/// A function implemented in Rust.
pub struct NativeFunction {
    signature: Signature,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(signature: Signature, func: NativeFn) -> Self {
        NativeFunction { signature, func }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.signature)
    }
}

impl CallableFunction for NativeFunction {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, ctx: &mut RuntimeContext, args: &[Value]) -> EvalResult {
        let args = normalize_args(&self.signature, args);
        (self.func)(ctx, &args)
    }
}
