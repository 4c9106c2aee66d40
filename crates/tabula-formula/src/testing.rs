//! Helpers shared by unit tests

use crate::context::{EvaluationContext, GridReader};
use crate::functions::{function_registry, FunctionImpl};
use crate::value::{Arg, ComputedValue};
use ahash::AHashMap;
use tabula_core::{EvaluationError, Range, SheetId, SheetLookup, SheetSize};

/// A grid with no sheets and no names
pub(crate) struct NoGrid;

impl SheetLookup for NoGrid {
    fn sheet_size(&self, _: &SheetId) -> Option<SheetSize> {
        None
    }

    fn sheet_name(&self, _: &SheetId) -> Option<&str> {
        None
    }

    fn sheet_id_by_name(&self, _: &str) -> Option<SheetId> {
        None
    }
}

impl GridReader for NoGrid {
    fn named_range(&self, _: &str) -> Option<Range> {
        None
    }
}

/// Call a function implementation outside of any cell
pub(crate) fn call(f: FunctionImpl, args: &[Arg]) -> Result<ComputedValue, EvaluationError> {
    let globals = AHashMap::new();
    let ctx = EvaluationContext::new(function_registry(), &globals, &NoGrid);
    f(args, &ctx)
}
