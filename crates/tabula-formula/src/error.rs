//! Formula error types

use tabula_core::EvaluationError;
use thiserror::Error;

/// Result type for formula compilation
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that prevent a formula from compiling
///
/// Failures while *executing* a compiled formula are
/// [`tabula_core::EvaluationError`] values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },
}

impl From<FormulaError> for EvaluationError {
    fn from(err: FormulaError) -> Self {
        EvaluationError::bad_expression(err.to_string())
    }
}
