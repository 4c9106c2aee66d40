//! Logical functions

use crate::context::EvaluationContext;
use crate::value::{Arg, ComputedValue};
use tabula_core::{EvaluationError, Value};

fn passthrough(arg: &Arg) -> Result<ComputedValue, EvaluationError> {
    match arg {
        Arg::Scalar(v) => Ok(ComputedValue::Scalar(v.clone())),
        Arg::Matrix(m) => Ok(ComputedValue::Matrix(m.clone())),
        Arg::Error(e) => Err(e.clone()),
    }
}

/// IF function
///
/// Receives failed branches as values: only the branch that is picked can
/// make the call fail.
pub fn fn_if(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    if args[0].boolean()? {
        passthrough(&args[1])
    } else {
        match args.get(2) {
            Some(arg) => passthrough(arg),
            None => Ok(ComputedValue::boolean(false)),
        }
    }
}

/// IFERROR function
pub fn fn_iferror(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    match &args[0] {
        Arg::Error(_) => match args.get(1) {
            Some(fallback) => passthrough(fallback),
            None => Ok(ComputedValue::text("")),
        },
        value => passthrough(value),
    }
}

/// Booleans taken into account by AND/OR; blanks and text in ranges are skipped
fn booleans(args: &[Arg], name: &str) -> Result<Vec<bool>, EvaluationError> {
    let mut booleans = Vec::new();
    for arg in args {
        match arg {
            Arg::Scalar(_) => booleans.push(arg.boolean()?),
            _ => {
                for cell in arg.cells() {
                    match cell?.value {
                        Value::Boolean(b) => booleans.push(b),
                        Value::Number(n) => booleans.push(n != 0.0),
                        Value::Text(_) | Value::Empty => {}
                    }
                }
            }
        }
    }
    if booleans.is_empty() {
        return Err(EvaluationError::generic(format!(
            "{} has no valid input data.",
            name
        )));
    }
    Ok(booleans)
}

/// AND function
pub fn fn_and(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let result = booleans(args, "AND")?.into_iter().all(|b| b);
    Ok(ComputedValue::boolean(result))
}

/// OR function
pub fn fn_or(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let result = booleans(args, "OR")?.into_iter().any(|b| b);
    Ok(ComputedValue::boolean(result))
}

/// NOT function
pub fn fn_not(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    Ok(ComputedValue::boolean(!args[0].boolean()?))
}
