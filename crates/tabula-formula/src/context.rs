//! What a compiled formula needs from the outside world

use crate::functions::FunctionRegistry;
use crate::value::{CellResult, RangeValues};
use ahash::AHashMap;
use once_cell::unsync::OnceCell;
use tabula_core::{EvaluationError, Position, Range, SheetLookup, Value};

/// Function argument a reference is being read for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgPosition<'a> {
    pub function: &'a str,
    /// 1-based
    pub index: usize,
}

/// Reads referenced cells on behalf of an executing formula
///
/// Implemented by the evaluation engine, which computes referenced cells on
/// demand and reports cycles as errors.
pub trait ReferenceResolver {
    /// Value of a single-cell reference
    ///
    /// A reference spanning several cells is an error. An error cell is
    /// returned as `Err` with the same error. In meta mode the address text
    /// of the reference is returned instead of its value.
    fn reference(&self, range: &Range, position: Option<ArgPosition<'_>>, is_meta: bool) -> CellResult;

    /// Values of a range, clipped to the sheet, column-major
    fn range(&self, range: &Range) -> Result<RangeValues, EvaluationError>;
}

/// Read-only access to the grid for formulas
pub trait GridReader: SheetLookup {
    /// Range bound to a defined name
    fn named_range(&self, name: &str) -> Option<Range>;
}

/// Everything a formula can consult besides its references
///
/// The position of the cell being evaluated is computed only if a function
/// asks for it.
pub struct EvaluationContext<'a> {
    functions: &'a FunctionRegistry,
    globals: &'a AHashMap<String, Value>,
    getters: &'a dyn GridReader,
    locate: Option<Box<dyn Fn() -> Option<Position> + 'a>>,
    current_position: OnceCell<Option<Position>>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        functions: &'a FunctionRegistry,
        globals: &'a AHashMap<String, Value>,
        getters: &'a dyn GridReader,
    ) -> Self {
        Self {
            functions,
            globals,
            getters,
            locate: None,
            current_position: OnceCell::new(),
        }
    }

    /// Set how to find the cell being evaluated
    pub fn with_current_position(mut self, locate: impl Fn() -> Option<Position> + 'a) -> Self {
        self.locate = Some(Box::new(locate));
        self
    }

    pub fn functions(&self) -> &'a FunctionRegistry {
        self.functions
    }

    pub fn getters(&self) -> &'a dyn GridReader {
        self.getters
    }

    /// Caller-supplied binding, matched case-insensitively
    pub fn global(&self, name: &str) -> Option<&'a Value> {
        self.globals.get(name).or_else(|| {
            self.globals
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Position of the cell being evaluated, if there is one
    pub fn current_position(&self) -> Option<Position> {
        *self
            .current_position
            .get_or_init(|| self.locate.as_ref().and_then(|locate| locate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::function_registry;
    use crate::testing::NoGrid;
    use std::cell::Cell;

    #[test]
    fn test_position_is_lazy_and_cached() {
        let globals = AHashMap::new();
        let calls = Cell::new(0);
        let ctx = EvaluationContext::new(function_registry(), &globals, &NoGrid)
            .with_current_position(|| {
                calls.set(calls.get() + 1);
                Some(Position::new(1, 2))
            });

        assert_eq!(calls.get(), 0);
        assert_eq!(ctx.current_position(), Some(Position::new(1, 2)));
        assert_eq!(ctx.current_position(), Some(Position::new(1, 2)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_globals_case_insensitive() {
        let mut globals = AHashMap::new();
        globals.insert("Rate".to_string(), Value::Number(0.2));
        let ctx = EvaluationContext::new(function_registry(), &globals, &NoGrid);
        assert_eq!(ctx.global("RATE"), Some(&Value::Number(0.2)));
        assert_eq!(ctx.global("other"), None);
    }
}
