//! Math functions

use super::first_format;
use crate::context::EvaluationContext;
use crate::value::{to_number, Arg, ComputedValue};
use tabula_core::{ErrorKind, EvaluationError, Value, ValueAndFormat};

/// Numbers taken into account by aggregate functions
///
/// Values passed directly are coerced; inside ranges only numbers count and
/// text, booleans and blanks are skipped. Any error cell fails the call.
fn numbers(args: &[Arg]) -> Result<Vec<f64>, EvaluationError> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            Arg::Scalar(v) => numbers.push(to_number(&v.value)?),
            Arg::Matrix(_) => {
                for cell in arg.cells() {
                    if let Value::Number(n) = cell?.value {
                        numbers.push(n);
                    }
                }
            }
            Arg::Error(e) => return Err(e.clone()),
        }
    }
    Ok(numbers)
}

fn with_format(n: f64, args: &[Arg]) -> ComputedValue {
    ComputedValue::Scalar(ValueAndFormat::new(n, first_format(args)))
}

/// SUM function
pub fn fn_sum(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let sum: f64 = numbers(args)?.iter().sum();
    Ok(with_format(sum, args))
}

/// AVERAGE function
pub fn fn_average(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let numbers = numbers(args)?;
    if numbers.is_empty() {
        return Err(EvaluationError::new(
            ErrorKind::DivisionByZero,
            "Evaluation of function AVERAGE caused a divide by zero error.",
        ));
    }
    let average = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Ok(with_format(average, args))
}

/// MIN function
pub fn fn_min(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let min = numbers(args)?.into_iter().reduce(f64::min).unwrap_or(0.0);
    Ok(with_format(min, args))
}

/// MAX function
pub fn fn_max(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let max = numbers(args)?.into_iter().reduce(f64::max).unwrap_or(0.0);
    Ok(with_format(max, args))
}

/// COUNT function
///
/// Counts numbers; errors and text are skipped instead of failing the call.
pub fn fn_count(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let mut count = 0;
    for arg in args {
        match arg {
            Arg::Scalar(v) => {
                if to_number(&v.value).is_ok() && !v.value.is_empty() {
                    count += 1;
                }
            }
            _ => {
                count += arg
                    .cells()
                    .filter(|cell| matches!(cell, Ok(ValueAndFormat { value: Value::Number(_), .. })))
                    .count();
            }
        }
    }
    Ok(ComputedValue::number(count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;

    fn n(x: f64) -> Arg {
        Arg::Scalar(ValueAndFormat::new(x, None))
    }

    fn column(values: Vec<Value>) -> Arg {
        Arg::Matrix(vec![values
            .into_iter()
            .map(|v| Ok(ValueAndFormat::new(v, None)))
            .collect()])
    }

    #[test]
    fn test_sum_skips_text_in_ranges() {
        let range = column(vec![Value::Number(1.0), Value::text("x"), Value::Empty, Value::Number(2.0)]);
        assert_eq!(call(fn_sum, &[range, n(3.0)]).unwrap(), ComputedValue::number(6.0));
    }

    #[test]
    fn test_sum_fails_on_error_cell() {
        let range = Arg::Matrix(vec![vec![
            Ok(ValueAndFormat::new(1.0, None)),
            Err(EvaluationError::division_by_zero()),
        ]]);
        assert_eq!(call(fn_sum, &[range]).unwrap_err().kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_sum_keeps_first_format() {
        let range = Arg::Matrix(vec![vec![Ok(ValueAndFormat::new(0.5, Some("0%".into())))]]);
        assert_eq!(
            call(fn_sum, &[range]).unwrap(),
            ComputedValue::Scalar(ValueAndFormat::new(0.5, Some("0%".into())))
        );
    }

    #[test]
    fn test_average() {
        assert_eq!(call(fn_average, &[n(1.0), n(2.0)]).unwrap(), ComputedValue::number(1.5));
        let empty = column(vec![Value::Empty]);
        assert_eq!(call(fn_average, &[empty]).unwrap_err().kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_min_max() {
        let range = column(vec![Value::Number(4.0), Value::Number(-2.0)]);
        assert_eq!(call(fn_min, &[range.clone()]).unwrap(), ComputedValue::number(-2.0));
        assert_eq!(call(fn_max, &[range]).unwrap(), ComputedValue::number(4.0));
        assert_eq!(call(fn_max, &[column(vec![])]).unwrap(), ComputedValue::number(0.0));
    }

    #[test]
    fn test_count() {
        let range = Arg::Matrix(vec![vec![
            Ok(ValueAndFormat::new(1.0, None)),
            Ok(ValueAndFormat::new("a", None)),
            Err(EvaluationError::division_by_zero()),
        ]]);
        assert_eq!(call(fn_count, &[range, n(2.0)]).unwrap(), ComputedValue::number(2.0));
    }
}
