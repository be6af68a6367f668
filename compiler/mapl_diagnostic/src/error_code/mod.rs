//! Error codes for transpilation diagnostics.
//!
//! The first digit names the check that produced the code.

use std::fmt;

/// Error codes for all transpilation diagnostics.
///
/// Format: E#### where first digit indicates the check:
/// - E1xxx: Scope errors
/// - E2xxx: Call signature errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Scope Errors (E1xxx)
    /// Variable read before any enclosing scope declares it
    E1001,
    /// Variable and output field share a name in one function
    E1002,
    /// Blank variable name
    E1003,

    // Signature Errors (E2xxx)
    /// More arguments than a non-variadic signature accepts
    E2001,
}

impl ErrorCode {
    /// All error codes, for exhaustive lookups.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E2001,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E2001 => "E2001",
        }
    }

    /// Check if this is a scope error (E1xxx range).
    pub fn is_scope_error(&self) -> bool {
        matches!(self, ErrorCode::E1001 | ErrorCode::E1002 | ErrorCode::E1003)
    }

    /// Check if this is a call signature error (E2xxx range).
    pub fn is_signature_error(&self) -> bool {
        matches!(self, ErrorCode::E2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E1001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
