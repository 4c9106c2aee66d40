//! Text functions

use crate::context::EvaluationContext;
use crate::value::{Arg, ComputedValue};
use tabula_core::EvaluationError;

/// CONCAT function
pub fn fn_concat(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    let mut result = String::new();
    for arg in args {
        for cell in arg.cells() {
            result.push_str(&cell?.value.to_string());
        }
    }
    Ok(ComputedValue::text(result))
}

/// LEN function
pub fn fn_len(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    Ok(ComputedValue::number(args[0].text()?.chars().count() as f64))
}

/// UPPER function
pub fn fn_upper(args: &[Arg], _ctx: &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError> {
    Ok(ComputedValue::text(args[0].text()?.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use tabula_core::{Value, ValueAndFormat};

    fn scalar(v: impl Into<Value>) -> Arg {
        Arg::Scalar(ValueAndFormat::new(v, None))
    }

    #[test]
    fn test_concat() {
        let range = Arg::Matrix(vec![
            vec![Ok(ValueAndFormat::new("a", None)), Ok(ValueAndFormat::default())],
            vec![Ok(ValueAndFormat::new(1.5, None)), Ok(ValueAndFormat::new(true, None))],
        ]);
        assert_eq!(
            call(fn_concat, &[range, scalar("!")]).unwrap(),
            ComputedValue::text("a1.5TRUE!")
        );
    }

    #[test]
    fn test_len_and_upper() {
        assert_eq!(call(fn_len, &[scalar("héllo")]).unwrap(), ComputedValue::number(5.0));
        assert_eq!(call(fn_len, &[scalar(12.0)]).unwrap(), ComputedValue::number(2.0));
        assert_eq!(call(fn_upper, &[scalar("abc")]).unwrap(), ComputedValue::text("ABC"));
    }
}
