//! Information functions

use crate::context::EvaluationContext;
use crate::value::{Arg, ComputedValue};
use tabula_core::{EvaluationError, UnboundedZone, Value};

/// ISERROR function
pub fn fn_iserror(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    Ok(ComputedValue::boolean(args[0].scalar().is_err()))
}

/// Zone of a reference passed in meta mode (`A1`, `Sheet2!B2:C3`, ...)
fn meta_zone(arg: &Arg, function: &str) -> Result<UnboundedZone, EvaluationError> {
    let not_a_reference = || {
        EvaluationError::generic(format!(
            "Function {} expects its parameter to be a cell reference.",
            function
        ))
    };
    match arg.scalar()?.value {
        Value::Text(address) => {
            let address = address.as_str();
            let address = address.rsplit_once('!').map_or(address, |(_, xc)| xc);
            address.parse().map_err(|_| not_a_reference())
        }
        _ => Err(not_a_reference()),
    }
}

/// ROW function
///
/// Without argument, the row of the cell being evaluated.
pub fn fn_row(args: &[Arg], ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let row = match args.first() {
        Some(arg) => meta_zone(arg, "ROW")?.top as f64,
        None => ctx
            .current_position()
            .ok_or_else(|| EvaluationError::generic("ROW needs a cell to evaluate in."))?
            .row as f64,
    };
    Ok(ComputedValue::number(row + 1.0))
}

/// COLUMN function
///
/// Without argument, the column of the cell being evaluated.
pub fn fn_column(args: &[Arg], ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let col = match args.first() {
        Some(arg) => meta_zone(arg, "COLUMN")?.left as f64,
        None => ctx
            .current_position()
            .ok_or_else(|| EvaluationError::generic("COLUMN needs a cell to evaluate in."))?
            .col as f64,
    };
    Ok(ComputedValue::number(col + 1.0))
}
