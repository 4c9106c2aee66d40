//! Cell-level evaluation errors

use std::fmt;
use thiserror::Error;

/// Kind of a cell-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// #REF - Reference to an invalid zone or an unknown sheet
    InvalidReference,
    /// #CYCLE - Circular reference, or a spill over one of the formula's dependencies
    CircularDependency,
    /// #SPILL! - An array result would overwrite existing data
    OverwriteData,
    /// #BAD_EXPR - The formula does not compile
    BadExpression,
    /// #ERROR - Any other failure during execution
    GenericError,
    /// #DIV/0! - Division by zero
    DivisionByZero,
    /// #NAME? - Unknown function or defined name
    UnknownFunction,
    /// #N/A - Value not available
    NotAvailable,
}

impl ErrorKind {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "#REF",
            ErrorKind::CircularDependency => "#CYCLE",
            ErrorKind::OverwriteData => "#SPILL!",
            ErrorKind::BadExpression => "#BAD_EXPR",
            ErrorKind::GenericError => "#ERROR",
            ErrorKind::DivisionByZero => "#DIV/0!",
            ErrorKind::UnknownFunction => "#NAME?",
            ErrorKind::NotAvailable => "#N/A",
        }
    }

    /// Parse an error literal
    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#REF" | "#REF!" => Some(ErrorKind::InvalidReference),
            "#CYCLE" => Some(ErrorKind::CircularDependency),
            "#SPILL!" => Some(ErrorKind::OverwriteData),
            "#BAD_EXPR" => Some(ErrorKind::BadExpression),
            "#ERROR" => Some(ErrorKind::GenericError),
            "#DIV/0!" => Some(ErrorKind::DivisionByZero),
            "#NAME?" => Some(ErrorKind::UnknownFunction),
            "#N/A" => Some(ErrorKind::NotAvailable),
            _ => None,
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "Invalid reference",
            ErrorKind::CircularDependency => "Circular reference",
            ErrorKind::OverwriteData => {
                "Array result was not expanded because it would overwrite data."
            }
            ErrorKind::BadExpression => "Invalid expression",
            ErrorKind::GenericError => "Error",
            ErrorKind::DivisionByZero => "Division by zero",
            ErrorKind::UnknownFunction => "Unknown function",
            ErrorKind::NotAvailable => "Value not available",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How loudly a failure should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A typed cell-level failure
///
/// Raised while executing a formula, propagated to dependents by re-raising
/// the same value, and finally stored on [`crate::EvaluatedCell::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{kind}: {message}")]
pub struct EvaluationError {
    pub kind: ErrorKind,
    pub message: String,
    pub severity: Severity,
}

impl EvaluationError {
    /// Create an error with an explicit message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let severity = match kind {
            ErrorKind::NotAvailable => Severity::Warning,
            _ => Severity::Error,
        };
        Self {
            kind,
            message: message.into(),
            severity,
        }
    }

    /// Create an error with the default message for its kind
    pub fn of(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    pub fn invalid_reference() -> Self {
        Self::of(ErrorKind::InvalidReference)
    }

    pub fn circular_dependency() -> Self {
        Self::of(ErrorKind::CircularDependency)
    }

    pub fn overwrite_data() -> Self {
        Self::of(ErrorKind::OverwriteData)
    }

    pub fn bad_expression(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadExpression, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GenericError, message)
    }

    pub fn division_by_zero() -> Self {
        Self::of(ErrorKind::DivisionByZero)
    }

    /// The error code shown in the cell
    pub fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl From<ErrorKind> for EvaluationError {
    fn from(kind: ErrorKind) -> Self {
        Self::of(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for kind in [
            ErrorKind::InvalidReference,
            ErrorKind::CircularDependency,
            ErrorKind::OverwriteData,
            ErrorKind::BadExpression,
            ErrorKind::GenericError,
            ErrorKind::DivisionByZero,
            ErrorKind::UnknownFunction,
            ErrorKind::NotAvailable,
        ] {
            assert_eq!(ErrorKind::from_code(kind.as_str()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code("#ref!"), Some(ErrorKind::InvalidReference));
        assert_eq!(ErrorKind::from_code("#FOO"), None);
    }

    #[test]
    fn test_severity() {
        assert_eq!(EvaluationError::of(ErrorKind::NotAvailable).severity, Severity::Warning);
        assert_eq!(EvaluationError::circular_dependency().severity, Severity::Error);
        assert_eq!(
            EvaluationError::generic("boom").to_string(),
            "#ERROR: boom"
        );
    }
}
