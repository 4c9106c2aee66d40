//! Functions returning arrays
//!
//! Results are column-major (`values[col][row]`) and spill from the
//! formula's cell.

use crate::context::EvaluationContext;
use crate::value::{Arg, CellResult, ComputedValue};
use tabula_core::{ErrorKind, EvaluationError, ValueAndFormat, MAX_COLS, MAX_ROWS};

/// Largest array a function may build, as many cells as a full column
const MAX_ARRAY_CELLS: usize = MAX_ROWS as usize;

fn optional_number(args: &[Arg], index: usize, default: f64) -> Result<f64, EvaluationError> {
    match args.get(index) {
        Some(arg) => arg.number(),
        None => Ok(default),
    }
}

fn dimension(value: f64, function: &str, what: &str) -> Result<usize, EvaluationError> {
    let value = value.trunc();
    if value < 1.0 {
        return Err(EvaluationError::generic(format!(
            "Function {} expects the number of {} to be positive.",
            function, what
        )));
    }
    Ok(value as usize)
}

/// Reject a result shape no sheet could hold, before allocating it
fn check_shape(rows: usize, cols: usize, function: &str) -> Result<(), EvaluationError> {
    let fits = rows <= MAX_ROWS as usize
        && cols <= MAX_COLS as usize
        && rows.checked_mul(cols).map_or(false, |cells| cells <= MAX_ARRAY_CELLS);
    if fits {
        Ok(())
    } else {
        Err(EvaluationError::new(
            ErrorKind::OverwriteData,
            format!(
                "Function {} would return a {}x{} array, which is too large to be expanded.",
                function, rows, cols
            ),
        ))
    }
}

/// SEQUENCE function
pub fn fn_sequence(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let rows = dimension(args[0].number()?, "SEQUENCE", "rows")?;
    let cols = dimension(optional_number(args, 1, 1.0)?, "SEQUENCE", "columns")?;
    let start = optional_number(args, 2, 1.0)?;
    let step = optional_number(args, 3, 1.0)?;
    check_shape(rows, cols, "SEQUENCE")?;

    let matrix: Vec<Vec<CellResult>> = (0..cols)
        .map(|col| {
            (0..rows)
                .map(|row| {
                    let n = start + step * (row * cols + col) as f64;
                    Ok(ValueAndFormat::new(n, None))
                })
                .collect()
        })
        .collect();
    Ok(ComputedValue::Matrix(matrix))
}

/// TRANSPOSE function
pub fn fn_transpose(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let matrix: Vec<Vec<CellResult>> = match &args[0] {
        Arg::Scalar(v) => return Ok(ComputedValue::Scalar(v.clone())),
        Arg::Matrix(m) => m.clone(),
        Arg::Error(e) => return Err(e.clone()),
    };
    let rows = matrix.first().map_or(0, Vec::len);
    if rows == 0 {
        return Err(EvaluationError::generic("TRANSPOSE of an empty range"));
    }
    let transposed: Vec<Vec<CellResult>> = (0..rows)
        .map(|row| matrix.iter().map(|col| col[row].clone()).collect())
        .collect();
    Ok(ComputedValue::Matrix(transposed))
}

/// MUNIT function
pub fn fn_munit(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let n = dimension(args[0].number()?, "MUNIT", "rows")?;
    check_shape(n, n, "MUNIT")?;
    let matrix: Vec<Vec<CellResult>> = (0..n)
        .map(|col| {
            (0..n)
                .map(|row| Ok(ValueAndFormat::new(if row == col { 1.0 } else { 0.0 }, None)))
                .collect()
        })
        .collect();
    Ok(ComputedValue::Matrix(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use pretty_assertions::assert_eq;

    fn n(x: f64) -> Arg {
        Arg::Scalar(ValueAndFormat::new(x, None))
    }

    fn numbers(value: ComputedValue) -> Vec<Vec<f64>> {
        match value {
            ComputedValue::Matrix(m) => m
                .into_iter()
                .map(|col| {
                    col.into_iter()
                        .map(|c| c.unwrap().value.as_number().unwrap())
                        .collect()
                })
                .collect(),
            ComputedValue::Scalar(_) => panic!("expected a matrix"),
        }
    }

    #[test]
    fn test_sequence_is_row_major_in_reading_order() {
        // 2 rows x 2 cols: A1=1, B1=2, A2=3, B2=4
        let result = call(fn_sequence, &[n(2.0), n(2.0)]).unwrap();
        assert_eq!(numbers(result), vec![vec![1.0, 3.0], vec![2.0, 4.0]]);

        let result = call(fn_sequence, &[n(3.0), n(1.0), n(10.0), n(5.0)]).unwrap();
        assert_eq!(numbers(result), vec![vec![10.0, 15.0, 20.0]]);

        assert!(call(fn_sequence, &[n(0.0)]).is_err());
    }

    #[test]
    fn test_oversized_arrays_are_rejected_before_allocation() {
        let error = call(fn_sequence, &[n(100_000_000.0), n(100_000.0)]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::OverwriteData);

        let error = call(fn_sequence, &[n(1.0), n(MAX_COLS as f64 + 1.0)]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::OverwriteData);

        let error = call(fn_munit, &[n(1e300)]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::OverwriteData);

        let result = call(fn_sequence, &[n(2.0), n(MAX_COLS as f64)]).unwrap();
        assert_eq!(result.dimensions(), (MAX_COLS as usize, 2));
    }

    #[test]
    fn test_transpose() {
        let column = call(fn_sequence, &[n(3.0)]).unwrap();
        let result = call(fn_transpose, &[Arg::from(column)]).unwrap();
        assert_eq!(result.dimensions(), (3, 1));
        assert_eq!(numbers(result), vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_munit() {
        let result = call(fn_munit, &[n(2.0)]).unwrap();
        assert_eq!(numbers(result), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
