//! Read access to a model
//!
//! Every getter that returns evaluated values runs the evaluation pass of
//! the sheet it reads if that sheet is stale.

use crate::command::Command;
use crate::evaluation::Evaluator;
use crate::model::Model;
use crate::named_ranges::NamedRange;
use tabula_core::{
    Error, EvaluatedCell, EvaluationError, Position, Range, Result, SheetId, Value, Zone,
};
use tabula_formula::{CompiledFormula, ComputedValue};

impl Model {
    /// Evaluated value of a cell; positions with nothing on them are empty
    pub fn evaluated_cell(&self, sheet_id: &SheetId, position: Position) -> EvaluatedCell {
        self.ensure_evaluated(sheet_id);
        self.evaluation()
            .borrow()
            .get(sheet_id, position)
            .cloned()
            .unwrap_or_else(EvaluatedCell::empty)
    }

    /// Every evaluated cell of a sheet, spilled values included, row by row
    pub fn evaluated_cells(&self, sheet_id: &SheetId) -> Vec<(Position, EvaluatedCell)> {
        self.ensure_evaluated(sheet_id);
        let cache = self.evaluation().borrow();
        let mut cells: Vec<(Position, EvaluatedCell)> = cache
            .cells(sheet_id)
            .map(|(position, cell)| (*position, cell.clone()))
            .collect();
        cells.sort_unstable_by_key(|(position, _)| (position.row, position.col));
        cells
    }

    /// Evaluate a formula that belongs to no cell, as if written on `sheet_id`
    ///
    /// An array result is returned as is, without spilling.
    pub fn evaluate_formula(&self, sheet_id: &SheetId, text: &str) -> std::result::Result<ComputedValue, EvaluationError> {
        if self.sheet(sheet_id).is_none() {
            return Err(EvaluationError::invalid_reference());
        }
        let compiled = CompiledFormula::compile(text)?;
        let dependencies: Vec<Range> = compiled
            .dependencies()
            .iter()
            .map(|xc| Range::from_sheet_xc(sheet_id, xc, self))
            .collect();

        self.ensure_evaluated(sheet_id);
        let cache = self.evaluation().borrow();
        let evaluator = Evaluator::new(self, &cache, None);
        let result = evaluator.run_formula(sheet_id, &compiled, &dependencies);
        result
    }

    /// Raw values of a range, row by row, clipped to its sheet
    ///
    /// Positions with nothing evaluated on them are `None`; an error reads
    /// as its code.
    pub fn range_values(&self, range: &Range) -> Result<Vec<Option<Value>>> {
        Ok(self
            .range_cells(range)?
            .into_iter()
            .map(|cell| cell.map(|cell| cell.value()))
            .collect())
    }

    /// Display strings of a range, row by row
    pub fn range_formatted_values(&self, range: &Range) -> Result<Vec<String>> {
        Ok(self
            .range_cells(range)?
            .into_iter()
            .map(|cell| cell.map(|cell| cell.formatted_value()).unwrap_or_default())
            .collect())
    }

    /// Parse a reference as written in a formula of `sheet_id`
    pub fn range_from_xc(&self, sheet_id: &SheetId, xc: &str) -> Range {
        Range::from_sheet_xc(sheet_id, xc, self)
    }

    /// Text of a range as a formula of `for_sheet` would show it
    pub fn range_string(&self, range: &Range, for_sheet: &SheetId) -> String {
        range.to_display_string(for_sheet, self)
    }

    /// Text of the cell at an address, if there is a cell
    pub fn cell_text(&self, sheet_id: &SheetId, xc: &str) -> Result<Option<&str>> {
        let position = Position::parse(xc)?;
        Ok(self.cell_at(sheet_id, position).map(|cell| cell.text()))
    }

    /// Set the text of the cell at an address
    ///
    /// ```rust
    /// let mut model = tabula::Model::new();
    /// let sheet = model.active_sheet_id().clone();
    /// model.set_cell_content(&sheet, "B2", "=1+1").unwrap();
    /// assert_eq!(model.cell_text(&sheet, "B2").unwrap(), Some("=1+1"));
    /// ```
    pub fn set_cell_content(&mut self, sheet_id: &SheetId, xc: &str, text: impl Into<String>) -> Result<()> {
        let position = Position::parse(xc)?;
        self.dispatch(Command::update_content(sheet_id, position, text))
    }

    pub fn defined_name(&self, name: &str) -> Option<&NamedRange> {
        self.names().get(name)
    }

    /// Defined names, sorted
    pub fn defined_names(&self) -> impl Iterator<Item = &NamedRange> {
        self.names().iter()
    }

    fn range_cells(&self, range: &Range) -> Result<Vec<Option<EvaluatedCell>>> {
        let (sheet_id, zone) = self.clipped_zone(range)?;
        self.ensure_evaluated(&sheet_id);
        let cache = self.evaluation().borrow();
        let cells = zone
            .positions()
            .map(|position| cache.get(&sheet_id, position).cloned())
            .collect();
        Ok(cells)
    }

    fn clipped_zone(&self, range: &Range) -> Result<(SheetId, Zone)> {
        let invalid = || Error::InvalidRange(range.invalid_xc().unwrap_or_default().to_string());
        if !range.is_valid() {
            return Err(invalid());
        }
        let sheet = range
            .sheet_id()
            .and_then(|id| self.sheet(id))
            .ok_or_else(invalid)?;
        let size = sheet.size();
        let bounds = Zone::new(0, 0, size.num_cols as i32 - 1, size.num_rows as i32 - 1);
        let zone = range
            .zone(self)
            .intersection(&bounds)
            .ok_or_else(|| Error::InvalidRange(range.to_display_string(sheet.id(), self)))?;
        Ok((sheet.id().clone(), zone))
    }
}
