use crate::{FunctionCall, Span};

/// What a [`ValueSource`] produces.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceKind {
    /// No value (placeholder slot, evaluates to null).
    #[default]
    Empty,
    ConstString(String),
    /// Integer literal. The runtime has a single number type, so this
    /// evaluates to the same value as the equivalent float.
    ConstInt(i64),
    ConstFloat(f64),
    ConstBool(bool),
    /// Read of a variable in the current frame.
    FromLocal(String),
    FunctionCall(Box<FunctionCall>),
    /// Unbound closure slot, filled later by position.
    FreeParameter(String),
}

/// An expression in the IR.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueSource {
    pub kind: SourceKind,
    /// Broadcast this argument element-wise over the enclosing call.
    pub iterate: bool,
    pub span: Span,
}

impl ValueSource {
    #[inline]
    pub fn new(kind: SourceKind, span: Span) -> Self {
        ValueSource {
            kind,
            iterate: false,
            span,
        }
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(SourceKind::ConstString(value.into()), span)
    }

    pub fn int(value: i64, span: Span) -> Self {
        Self::new(SourceKind::ConstInt(value), span)
    }

    pub fn float(value: f64, span: Span) -> Self {
        Self::new(SourceKind::ConstFloat(value), span)
    }

    pub fn bool(value: bool, span: Span) -> Self {
        Self::new(SourceKind::ConstBool(value), span)
    }

    pub fn local(name: impl Into<String>, span: Span) -> Self {
        Self::new(SourceKind::FromLocal(name.into()), span)
    }

    pub fn free(name: impl Into<String>, span: Span) -> Self {
        Self::new(SourceKind::FreeParameter(name.into()), span)
    }

    pub fn call(call: FunctionCall) -> Self {
        let span = call.span;
        Self::new(SourceKind::FunctionCall(Box::new(call)), span)
    }

    /// Set the iterate flag.
    #[must_use]
    pub fn with_iterate(mut self, iterate: bool) -> Self {
        self.iterate = iterate;
        self
    }

    #[inline]
    pub fn is_free_parameter(&self) -> bool {
        matches!(self.kind, SourceKind::FreeParameter(_))
    }

    /// The nested call, if this source is one.
    pub fn as_call(&self) -> Option<&FunctionCall> {
        match &self.kind {
            SourceKind::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    /// The variable name, if this source reads a local.
    pub fn as_local(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::FromLocal(name) => Some(name),
            _ => None,
        }
    }
}
