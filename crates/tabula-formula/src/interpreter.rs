//! Formula interpreter
//!
//! Walks a compiled AST. References are never read directly: each one is
//! handed to the [`ReferenceResolver`] together with how the surrounding
//! function wants it (single value, whole range, or address only).

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::context::{ArgPosition, EvaluationContext, ReferenceResolver};
use crate::functions::{ArgKind, FunctionDef};
use crate::value::{to_number, Arg, CellResult, ComputedValue, RangeValues};
use std::cmp::Ordering;
use tabula_core::{ErrorKind, EvaluationError, Range, Value, ValueAndFormat};

/// Evaluates one formula against its resolved dependencies
pub struct Interpreter<'a, 'c> {
    dependencies: &'a [Range],
    resolver: &'a dyn ReferenceResolver,
    ctx: &'a EvaluationContext<'c>,
}

impl<'a, 'c> Interpreter<'a, 'c> {
    pub fn new(
        dependencies: &'a [Range],
        resolver: &'a dyn ReferenceResolver,
        ctx: &'a EvaluationContext<'c>,
    ) -> Self {
        Self {
            dependencies,
            resolver,
            ctx,
        }
    }

    /// Evaluate a whole formula
    ///
    /// A blank result reads as zero and a 1x1 block as its only value.
    pub fn run(&self, expr: &Expr) -> Result<ComputedValue, EvaluationError> {
        let result = match self.evaluate(expr)? {
            ComputedValue::Matrix(mut cols) => {
                if cols.is_empty() || cols.iter().any(Vec::is_empty) {
                    return Err(EvaluationError::invalid_reference());
                }
                if cols.len() > 1 || cols[0].len() > 1 {
                    return Ok(ComputedValue::Matrix(cols));
                }
                match cols.pop().and_then(|mut col| col.pop()) {
                    Some(cell) => ComputedValue::Scalar(cell?),
                    None => return Err(EvaluationError::invalid_reference()),
                }
            }
            scalar => scalar,
        };

        Ok(match result {
            ComputedValue::Scalar(ValueAndFormat {
                value: Value::Empty,
                format,
            }) => ComputedValue::Scalar(ValueAndFormat::new(0.0, format)),
            other => other,
        })
    }

    fn evaluate(&self, expr: &Expr) -> Result<ComputedValue, EvaluationError> {
        match expr {
            Expr::Number(n) => Ok(ComputedValue::number(*n)),
            Expr::Text(s) => Ok(ComputedValue::text(s)),
            Expr::Boolean(b) => Ok(ComputedValue::boolean(*b)),
            Expr::Error(kind) => Err(EvaluationError::of(*kind)),

            Expr::Reference(index) => {
                let range = self.dependency(*index)?;
                self.read(range)
            }

            Expr::Name(name) => match self.ctx.getters().named_range(name) {
                Some(range) => self.read(&range),
                None => self
                    .ctx
                    .global(name)
                    .map(|value| ComputedValue::Scalar(ValueAndFormat::new(value.clone(), None)))
                    .ok_or_else(|| {
                        EvaluationError::new(
                            ErrorKind::UnknownFunction,
                            format!("Invalid name: \"{}\"", name),
                        )
                    }),
            },

            Expr::Unary { op, operand } => {
                let value = Arg::from(self.evaluate(operand)?).scalar()?;
                match op {
                    UnaryOperator::Plus => Ok(ComputedValue::Scalar(value)),
                    UnaryOperator::Negate => Ok(ComputedValue::Scalar(ValueAndFormat::new(
                        -to_number(&value.value)?,
                        value.format,
                    ))),
                    UnaryOperator::Percent => {
                        Ok(ComputedValue::number(to_number(&value.value)? / 100.0))
                    }
                }
            }

            Expr::Binary { op, left, right } => {
                let left = Arg::from(self.evaluate(left)?).scalar()?;
                let right = Arg::from(self.evaluate(right)?).scalar()?;
                binary_op(*op, left, right).map(ComputedValue::Scalar)
            }

            Expr::Function { name, args } => self.call(name, args),

            Expr::Array(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                let mut cols: Vec<Vec<CellResult>> = vec![Vec::with_capacity(rows.len()); width];
                for row in rows {
                    for (col, item) in row.iter().enumerate() {
                        let value = Arg::from(self.evaluate(item)?).scalar()?;
                        cols[col].push(Ok(value));
                    }
                }
                Ok(ComputedValue::Matrix(cols))
            }
        }
    }

    fn dependency(&self, index: usize) -> Result<&'a Range, EvaluationError> {
        self.dependencies
            .get(index)
            .ok_or_else(EvaluationError::invalid_reference)
    }

    /// Read a reference outside of any function argument
    fn read(&self, range: &Range) -> Result<ComputedValue, EvaluationError> {
        let single_cell = range
            .unbounded_zone()
            .bounded()
            .map_or(false, |zone| zone.is_single_cell());
        if single_cell {
            self.resolver
                .reference(range, None, false)
                .map(ComputedValue::Scalar)
        } else {
            Ok(ComputedValue::Matrix(dense(self.resolver.range(range)?)))
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<ComputedValue, EvaluationError> {
        let def = self.ctx.functions().get(name).ok_or_else(|| {
            EvaluationError::new(
                ErrorKind::UnknownFunction,
                format!("Unknown function: \"{}\"", name),
            )
        })?;
        if !def.accepts(args.len()) {
            return Err(EvaluationError::bad_expression(format!(
                "Invalid number of arguments for the {} function. Expected {}, but got {} instead.",
                def.name,
                def.arity(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match self.evaluate_arg(arg, def, i + 1) {
                Ok(value) => values.push(value),
                Err(error) if def.error_aware => values.push(Arg::Error(error)),
                Err(error) => return Err(error),
            }
        }

        (def.implementation)(&values, self.ctx)
    }

    fn evaluate_arg(&self, expr: &Expr, def: &FunctionDef, index: usize) -> Result<Arg, EvaluationError> {
        let position = Some(ArgPosition {
            function: def.name,
            index,
        });
        let named;
        let range = match expr {
            Expr::Reference(i) => self.dependency(*i)?,
            Expr::Name(name) => match self.ctx.getters().named_range(name) {
                Some(range) => {
                    named = range;
                    &named
                }
                None => return self.evaluate(expr).map(Arg::from),
            },
            _ => return self.evaluate(expr).map(Arg::from),
        };

        match def.arg_kind {
            ArgKind::Value => self.resolver.reference(range, position, false).map(Arg::Scalar),
            ArgKind::Meta => self.resolver.reference(range, position, true).map(Arg::Scalar),
            ArgKind::Range => Ok(Arg::Matrix(dense(self.resolver.range(range)?))),
        }
    }
}

/// Blank positions of a range read as empty values
fn dense(values: RangeValues) -> Vec<Vec<CellResult>> {
    values
        .into_iter()
        .map(|col| {
            col.into_iter()
                .map(|cell| cell.unwrap_or_else(|| Ok(ValueAndFormat::default())))
                .collect()
        })
        .collect()
}

fn binary_op(
    op: BinaryOperator,
    left: ValueAndFormat,
    right: ValueAndFormat,
) -> Result<ValueAndFormat, EvaluationError> {
    use BinaryOperator::*;

    match op {
        Add | Subtract => {
            let (l, r) = (to_number(&left.value)?, to_number(&right.value)?);
            let result = if op == Add { l + r } else { l - r };
            Ok(ValueAndFormat::new(result, left.format.or(right.format)))
        }
        Multiply => Ok(ValueAndFormat::new(
            to_number(&left.value)? * to_number(&right.value)?,
            None,
        )),
        Divide => {
            let (l, r) = (to_number(&left.value)?, to_number(&right.value)?);
            if r == 0.0 {
                return Err(EvaluationError::division_by_zero());
            }
            Ok(ValueAndFormat::new(l / r, None))
        }
        Power => {
            let result = to_number(&left.value)?.powf(to_number(&right.value)?);
            if !result.is_finite() {
                return Err(EvaluationError::generic("Invalid result for the power operator"));
            }
            Ok(ValueAndFormat::new(result, None))
        }
        Concat => Ok(ValueAndFormat::new(
            format!("{}{}", left.value, right.value),
            None,
        )),
        Equal | NotEqual | LessThan | LessEqual | GreaterThan | GreaterEqual => {
            let ordering = compare_values(&left.value, &right.value);
            let result = match op {
                Equal => ordering == Ordering::Equal,
                NotEqual => ordering != Ordering::Equal,
                LessThan => ordering == Ordering::Less,
                LessEqual => ordering != Ordering::Greater,
                GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(ValueAndFormat::new(result, None))
        }
    }
}

/// Compare two values the way spreadsheets sort them
///
/// Numbers < text < booleans; text compares case-insensitively; a blank
/// takes the type of the other side.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) | Value::Empty => 0,
            Value::Text(_) => 1,
            Value::Boolean(_) => 2,
        }
    }

    match (left, right) {
        (Value::Empty, Value::Empty) => Ordering::Equal,
        (Value::Empty, Value::Text(s)) => "".cmp(&s.as_str().to_lowercase().as_str()),
        (Value::Text(s), Value::Empty) => s.as_str().to_lowercase().as_str().cmp(""),
        (Value::Empty, Value::Boolean(b)) => false.cmp(b),
        (Value::Boolean(b), Value::Empty) => b.cmp(&false),
        (Value::Text(l), Value::Text(r)) => l
            .as_str()
            .to_lowercase()
            .cmp(&r.as_str().to_lowercase()),
        (Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
        (l, r) if rank(l) == 0 && rank(r) == 0 => {
            let (l, r) = (l.as_number().unwrap_or(0.0), r.as_number().unwrap_or(0.0));
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (l, r) => rank(l).cmp(&rank(r)),
    }
}
