//! Values flowing through formula execution

use tabula_core::{EvaluationError, Value, ValueAndFormat};

/// The content of one cell as seen by a formula: a value, or the error the cell is in
pub type CellResult = Result<ValueAndFormat, EvaluationError>;

/// Cells of a range, column-major (`values[col][row]`)
///
/// `None` marks a position with no cell at all, as opposed to a cell whose
/// value is empty.
pub type RangeValues = Vec<Vec<Option<CellResult>>>;

/// Result of executing a formula
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedValue {
    /// A single value
    Scalar(ValueAndFormat),
    /// A block of values, column-major (`values[col][row]`), never empty
    Matrix(Vec<Vec<CellResult>>),
}

impl ComputedValue {
    pub fn number(n: f64) -> Self {
        ComputedValue::Scalar(ValueAndFormat::new(n, None))
    }

    pub fn boolean(b: bool) -> Self {
        ComputedValue::Scalar(ValueAndFormat::new(b, None))
    }

    pub fn text(s: impl AsRef<str>) -> Self {
        ComputedValue::Scalar(ValueAndFormat::new(Value::text(s), None))
    }

    /// Number of columns and rows
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            ComputedValue::Scalar(_) => (1, 1),
            ComputedValue::Matrix(cols) => (cols.len(), cols.first().map_or(0, Vec::len)),
        }
    }
}

impl From<ValueAndFormat> for ComputedValue {
    fn from(value: ValueAndFormat) -> Self {
        ComputedValue::Scalar(value)
    }
}

/// An evaluated function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Scalar(ValueAndFormat),
    /// Column-major block of cells (a range or an array)
    Matrix(Vec<Vec<CellResult>>),
    /// The argument failed; only passed to error-aware functions
    Error(EvaluationError),
}

impl Arg {
    /// Every cell of the argument, column by column
    pub fn cells(&self) -> Box<dyn Iterator<Item = CellResult> + '_> {
        match self {
            Arg::Scalar(v) => Box::new(std::iter::once(Ok(v.clone()))),
            Arg::Matrix(cols) => Box::new(cols.iter().flatten().cloned()),
            Arg::Error(e) => Box::new(std::iter::once(Err(e.clone()))),
        }
    }

    /// The argument as one value; a block must be 1x1
    pub fn scalar(&self) -> Result<ValueAndFormat, EvaluationError> {
        match self {
            Arg::Scalar(v) => Ok(v.clone()),
            Arg::Matrix(cols) => match cols.as_slice() {
                [col] if col.len() == 1 => col[0].clone(),
                _ => Err(EvaluationError::generic(
                    "Expected a single value, got a range",
                )),
            },
            Arg::Error(e) => Err(e.clone()),
        }
    }

    /// Convert to a number, coercing numeric text
    pub fn number(&self) -> Result<f64, EvaluationError> {
        to_number(&self.scalar()?.value)
    }

    pub fn boolean(&self) -> Result<bool, EvaluationError> {
        let value = self.scalar()?.value;
        match &value {
            Value::Text(s) => value.as_bool().ok_or_else(|| {
                EvaluationError::generic(format!(
                    "The value '{}' cannot be converted to a boolean",
                    s
                ))
            }),
            other => Ok(other.as_bool().unwrap_or(false)),
        }
    }

    pub fn text(&self) -> Result<String, EvaluationError> {
        Ok(self.scalar()?.value.to_string())
    }
}

impl From<ComputedValue> for Arg {
    fn from(value: ComputedValue) -> Self {
        match value {
            ComputedValue::Scalar(v) => Arg::Scalar(v),
            ComputedValue::Matrix(m) => Arg::Matrix(m),
        }
    }
}

/// Numeric value of a scalar; text must parse as a number
pub fn to_number(value: &Value) -> Result<f64, EvaluationError> {
    match value {
        Value::Text(s) => {
            let trimmed = s.as_str().trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            match ValueAndFormat::parse_literal(trimmed).value {
                Value::Number(n) => Ok(n),
                _ => Err(EvaluationError::generic(format!(
                    "The value '{}' cannot be converted to a number",
                    s
                ))),
            }
        }
        other => Ok(other.as_number().unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::ErrorKind;

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::text("12")).unwrap(), 12.0);
        assert_eq!(to_number(&Value::text("50%")).unwrap(), 0.5);
        assert_eq!(to_number(&Value::Boolean(true)).unwrap(), 1.0);
        let err = to_number(&Value::text("abc")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::GenericError);
    }

    #[test]
    fn test_single_cell_matrix_is_scalar() {
        let arg = Arg::Matrix(vec![vec![Ok(ValueAndFormat::new(3.0, None))]]);
        assert_eq!(arg.number().unwrap(), 3.0);

        let arg = Arg::Matrix(vec![
            vec![Ok(ValueAndFormat::default())],
            vec![Ok(ValueAndFormat::default())],
        ]);
        assert!(arg.scalar().is_err());
    }

    #[test]
    fn test_cells_are_column_major() {
        let n = |x: f64| Ok(ValueAndFormat::new(x, None));
        let arg = Arg::Matrix(vec![vec![n(1.0), n(2.0)], vec![n(3.0), n(4.0)]]);
        let values: Vec<f64> = arg.cells().map(|c| c.unwrap().value.as_number().unwrap()).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
