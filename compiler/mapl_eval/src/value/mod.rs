//! Runtime values of the Mapl mapping language.
//!
//! # Arc Enforcement
//!
//! Every heap payload lives behind [`Heap<T>`], whose constructor is private
//! to this module: build values through the factory methods
//! (`Value::string`, `Value::array`, `Value::container`, ...).
//!
//! ```text
//! let s = Value::string("hello");           // OK
//! let s = Value::Str(Heap::new(..));        // ERROR: Heap::new is pub(super)
//! ```
//!
//! # Closures are values
//!
//! A partially applied call is an ordinary [`Value::Closure`]; binding and
//! execution are reached by matching on the variant, never by downcasting.
//!
//! # Thread Safety
//!
//! Values are immutable once built. Writes through a path
//! ([`Value::with_path`]) produce a new value, copying a payload only when
//! it is shared, so one value can be read from many workers at once.

mod heap;

use std::collections::BTreeMap;
use std::fmt;

use mapl_ir::PathSegment;

pub use heap::Heap;

use crate::closure::Closure;
use crate::errors::{invalid_write, EvalResult};

/// Field map of a container. Ordered so that iteration and display are
/// deterministic.
pub type Fields = BTreeMap<String, Value>;

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// The language has a single number type.
    Number(f64),
    Str(Heap<String>),
    Array(Heap<Vec<Value>>),
    Container(Heap<Fields>),
    /// Large collection processed element-wise (in parallel by `iterate`).
    Dataset(Heap<Vec<Value>>),
    Closure(Heap<Closure>),
    /// Unbound slot of a closure under construction.
    FreeParameter(Heap<String>),
    /// Host value seen through a transparent adapter.
    Wrapped(Heap<Value>),
}

/// Concrete kind of a value, as named in argument types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Kind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Container,
    Dataset,
    Closure,
}

/// Structural capability a value may satisfy.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Capability {
    Primitive,
    Array,
    Container,
    Dataset,
}

impl Kind {
    /// Capabilities of values of this kind. Null satisfies all of them so
    /// that a missing value can flow into any structural parameter.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Kind::Null => &[
                Capability::Primitive,
                Capability::Array,
                Capability::Container,
                Capability::Dataset,
            ],
            Kind::Boolean | Kind::Number | Kind::String => &[Capability::Primitive],
            Kind::Array => &[Capability::Array],
            Kind::Container => &[Capability::Container],
            Kind::Dataset => &[Capability::Dataset],
            Kind::Closure => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Container => "container",
            Kind::Dataset => "dataset",
            Kind::Closure => "closure",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Primitive => "Primitive",
            Capability::Array => "Array",
            Capability::Container => "Container",
            Capability::Dataset => "Dataset",
        })
    }
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "integer literals share the single f64 number type"
    )]
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Number(n as f64)
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Heap::new(items))
    }

    pub fn container<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Container(Heap::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    #[inline]
    pub fn dataset(items: Vec<Value>) -> Self {
        Value::Dataset(Heap::new(items))
    }

    #[inline]
    pub fn closure(closure: Closure) -> Self {
        Value::Closure(Heap::new(closure))
    }

    #[inline]
    pub fn free_parameter(name: impl Into<String>) -> Self {
        Value::FreeParameter(Heap::new(name.into()))
    }

    #[inline]
    pub fn wrapped(inner: Value) -> Self {
        Value::Wrapped(Heap::new(inner))
    }
}

// Inspection

impl Value {
    /// Kind of the value, looking through adapters. A free parameter
    /// marker reports [`Kind::Null`].
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null | Value::FreeParameter(_) => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::Str(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Container(_) => Kind::Container,
            Value::Dataset(_) => Kind::Dataset,
            Value::Closure(_) => Kind::Closure,
            Value::Wrapped(inner) => inner.kind(),
        }
    }

    #[inline]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.kind().capabilities().contains(&capability)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::FreeParameter(_) => "free parameter",
            other => other.kind().name(),
        }
    }

    /// The value behind any number of adapter layers.
    pub fn unwrapped(&self) -> &Value {
        let mut value = self;
        while let Value::Wrapped(inner) = value {
            value = inner;
        }
        value
    }

    /// Null, an empty string, or an empty array or container. A dataset is
    /// a handle and never counts as empty, so it only dispatches to
    /// dataset overloads.
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Value::Null | Value::FreeParameter(_) => true,
            Value::Str(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Container(fields) => fields.is_empty(),
            Value::Bool(_) | Value::Number(_) | Value::Dataset(_) | Value::Closure(_) => false,
            Value::Wrapped(inner) => inner.is_null_or_empty(),
        }
    }

    /// Booleans are themselves; everything else is truthy unless null or
    /// empty.
    pub fn is_truthy(&self) -> bool {
        match self.unwrapped() {
            Value::Bool(b) => *b,
            other => !other.is_null_or_empty(),
        }
    }

    #[inline]
    pub fn is_free_parameter(&self) -> bool {
        matches!(self, Value::FreeParameter(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unwrapped() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.unwrapped() {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.unwrapped() {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self.unwrapped() {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Fields> {
        match self.unwrapped() {
            Value::Container(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self.unwrapped() {
            Value::Closure(closure) => Some(closure),
            _ => None,
        }
    }

    /// Field of a container, or null.
    pub fn field(&self, name: &str) -> Value {
        self.as_container()
            .and_then(|fields| fields.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Text form used when a value is concatenated into a string: strings
    /// are unquoted and null is empty.
    pub fn to_text(&self) -> String {
        match self.unwrapped() {
            Value::Str(s) => s.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

// Writes

impl Value {
    /// Write `value` at `path` below `self`, returning the updated value.
    ///
    /// Missing or empty intermediate levels are created. When `merge` is
    /// set the existing value at the end of the path is merged with `value`
    /// (see [`Value::merge`]); otherwise it is replaced.
    pub fn with_path(self, path: &[PathSegment], value: Value, merge: bool) -> EvalResult {
        let Some((segment, rest)) = path.split_first() else {
            return Ok(if merge { self.merge(value) } else { value });
        };

        match segment {
            PathSegment::Field(name) => {
                let mut fields = match self {
                    Value::Container(fields) => fields.into_owned(),
                    empty if empty.is_null_or_empty() => Fields::new(),
                    other => return Err(invalid_write(segment, &other)),
                };
                let child = fields.remove(name).unwrap_or_default();
                fields.insert(name.clone(), child.with_path(rest, value, merge)?);
                Ok(Value::Container(Heap::new(fields)))
            }
            PathSegment::Index(index) => {
                let mut items = self.into_items(segment)?;
                let index = *index as usize;
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                let child = std::mem::take(&mut items[index]);
                items[index] = child.with_path(rest, value, merge)?;
                Ok(Value::array(items))
            }
            PathSegment::Append => {
                let mut items = self.into_items(segment)?;
                items.push(Value::Null.with_path(rest, value, merge)?);
                Ok(Value::array(items))
            }
        }
    }

    fn into_items(self, segment: &PathSegment) -> EvalResult<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items.into_owned()),
            empty if empty.is_null_or_empty() => Ok(Vec::new()),
            other => Err(invalid_write(segment, &other)),
        }
    }

    /// Combine two values written to the same place: containers merge field
    /// by field, arrays concatenate, a null or empty incoming value keeps
    /// the existing one, anything else replaces it.
    #[must_use]
    pub fn merge(self, incoming: Value) -> Value {
        match (self, incoming) {
            (Value::Container(current), Value::Container(incoming)) => {
                let mut fields = current.into_owned();
                for (name, value) in incoming.iter() {
                    let existing = fields.remove(name).unwrap_or_default();
                    fields.insert(name.clone(), existing.merge(value.clone()));
                }
                Value::Container(Heap::new(fields))
            }
            (Value::Array(current), Value::Array(incoming)) => {
                let mut items = current.into_owned();
                items.extend(incoming.iter().cloned());
                Value::array(items)
            }
            (current, incoming) if incoming.is_null_or_empty() => current,
            (_, incoming) => incoming,
        }
    }
}

/// Null equals every null-or-empty value; adapters compare by their
/// payload.
impl PartialEq for Value {
    #[allow(clippy::float_cmp, reason = "language equality is exact")]
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.unwrapped(), other.unwrapped());
        let either_null = matches!(a, Value::Null) || matches!(b, Value::Null);
        if either_null && a.is_null_or_empty() && b.is_null_or_empty() {
            return true;
        }
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Array(x), Value::Array(y)) | (Value::Dataset(x), Value::Dataset(y)) => x == y,
            (Value::Container(x), Value::Container(y)) => x == y,
            (Value::Closure(x), Value::Closure(y)) => Heap::ptr_eq(x, y),
            (Value::FreeParameter(x), Value::FreeParameter(y)) => x == y,
            _ => false,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    reason = "guarded: integral and within i64 range"
)]
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::Array(items) | Value::Dataset(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Container(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name:?}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Closure(closure) => write!(f, "<closure {}>", closure.name()),
            Value::FreeParameter(name) => write!(f, "<free {name}>"),
            Value::Wrapped(inner) => inner.fmt(f),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Array(items) => f.debug_tuple("Array").field(&**items).finish(),
            Value::Container(fields) => f.debug_tuple("Container").field(&**fields).finish(),
            Value::Dataset(items) => write!(f, "Dataset(<{} items>)", items.len()),
            Value::Closure(closure) => write!(f, "Closure({closure:?})"),
            Value::FreeParameter(name) => write!(f, "FreeParameter({name})"),
            Value::Wrapped(inner) => write!(f, "Wrapped({inner:?})"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
