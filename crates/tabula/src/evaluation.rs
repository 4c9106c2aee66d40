//! Evaluation engine
//!
//! One pass evaluates every cell of one sheet. Cells are computed on
//! demand: a formula reading another cell computes it first, so no
//! dependency graph is kept. Each cell goes through
//! `NotComputed -> ComputingWaitingRef -> Computed` during a pass; reaching
//! a cell that is still `ComputingWaitingRef` means a cycle, which is
//! reported as an error on the cell that asked.
//!
//! A formula reading a blank cell or a range first computes the formulas
//! above and to the left, since one of them may spill into what it reads.
//! Such a look-back can reach a formula that reads the cell that started
//! it. That is not a cycle: the formula is left uncomputed and the main
//! pass gets to it once its input is done.
//!
//! Results of finished passes are kept per sheet in [`EvaluationCache`]
//! until an edit makes them stale.

use crate::cell::{Cell, CellContent};
use crate::model::Model;
use crate::sheet::{Sheet, SheetObserver};
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tabula_core::{
    ErrorKind, EvaluatedCell, EvaluationError, Position, Range, SheetId, Value, ValueAndFormat,
    Zone,
};
use tabula_formula::{
    function_registry, ArgPosition, CellResult, CompiledFormula, ComputedValue, EvaluationContext,
    RangeValues, ReferenceResolver,
};
use tracing::debug;

/// Evaluated cells of every sheet, with a per-sheet up-to-date flag
#[derive(Debug, Default)]
pub(crate) struct EvaluationCache {
    sheets: AHashMap<SheetId, SheetResults>,
}

#[derive(Debug, Default)]
struct SheetResults {
    up_to_date: bool,
    cells: AHashMap<Position, EvaluatedCell>,
}

impl EvaluationCache {
    pub(crate) fn is_up_to_date(&self, sheet_id: &SheetId) -> bool {
        self.sheets.get(sheet_id).map_or(false, |s| s.up_to_date)
    }

    pub(crate) fn get(&self, sheet_id: &SheetId, position: Position) -> Option<&EvaluatedCell> {
        self.sheets.get(sheet_id)?.cells.get(&position)
    }

    /// Evaluated cells of a sheet, in no particular order
    pub(crate) fn cells(&self, sheet_id: &SheetId) -> impl Iterator<Item = (&Position, &EvaluatedCell)> {
        self.sheets
            .get(sheet_id)
            .into_iter()
            .flat_map(|s| s.cells.iter())
    }

    pub(crate) fn store(&mut self, sheet_id: &SheetId, cells: AHashMap<Position, EvaluatedCell>) {
        self.sheets.insert(
            sheet_id.clone(),
            SheetResults {
                up_to_date: true,
                cells,
            },
        );
    }

    pub(crate) fn invalidate(&mut self, sheet_id: &SheetId) {
        if let Some(sheet) = self.sheets.get_mut(sheet_id) {
            sheet.up_to_date = false;
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        for sheet in self.sheets.values_mut() {
            sheet.up_to_date = false;
        }
    }
}

impl SheetObserver for EvaluationCache {
    fn on_sheet_created(&mut self, sheet_id: &SheetId) {
        self.sheets.insert(sheet_id.clone(), SheetResults::default());
    }

    fn on_sheet_deleted(&mut self, sheet_id: &SheetId) {
        self.sheets.remove(sheet_id);
    }

    fn on_sheet_duplicated(&mut self, _from: &SheetId, to: &SheetId) {
        self.sheets.insert(to.clone(), SheetResults::default());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    ComputingWaitingRef,
    Computed,
}

type CellKey = (SheetId, Position);

/// One evaluation pass
///
/// Sheets that are up to date in the cache (other than the one being
/// evaluated) are read from it instead of being recomputed.
pub(crate) struct Evaluator<'m> {
    model: &'m Model,
    cache: &'m EvaluationCache,
    target: Option<SheetId>,
    states: RefCell<AHashMap<CellKey, CellState>>,
    results: RefCell<AHashMap<CellKey, EvaluatedCell>>,
    /// Formulas being computed, outermost first
    in_progress: RefCell<Vec<CellKey>>,
    /// Length of `in_progress` when each running look-back started
    look_backs: RefCell<Vec<usize>>,
    /// Set when the formula being computed read a cell that was waiting on
    /// the current look-back
    blocked: std::cell::Cell<bool>,
    /// Formula cells of each sheet, column by column from the bottom-right
    formula_positions: RefCell<AHashMap<SheetId, Rc<Vec<Position>>>>,
}

impl<'m> Evaluator<'m> {
    pub(crate) fn new(model: &'m Model, cache: &'m EvaluationCache, target: Option<SheetId>) -> Self {
        Self {
            model,
            cache,
            target,
            states: RefCell::new(AHashMap::new()),
            results: RefCell::new(AHashMap::new()),
            in_progress: RefCell::new(Vec::new()),
            look_backs: RefCell::new(Vec::new()),
            blocked: std::cell::Cell::new(false),
            formula_positions: RefCell::new(AHashMap::new()),
        }
    }

    /// Evaluate every cell of the target sheet, in reading order
    pub(crate) fn run_pass(self) -> AHashMap<Position, EvaluatedCell> {
        let Some(sheet) = self.target.as_ref().and_then(|id| self.model.sheet(id)) else {
            return AHashMap::new();
        };

        debug!(sheet = %sheet.id(), cells = sheet.cell_count(), "evaluation pass started");
        for (position, _) in sheet.cells() {
            self.compute_cell(sheet.id(), position);
        }

        let results: AHashMap<Position, EvaluatedCell> = self
            .results
            .into_inner()
            .into_iter()
            .filter(|((sheet_id, _), _)| sheet_id == sheet.id())
            .map(|((_, position), cell)| (position, cell))
            .collect();
        debug!(sheet = %sheet.id(), evaluated = results.len(), "evaluation pass finished");
        results
    }

    /// Run a formula that belongs to no cell
    pub(crate) fn run_formula(
        &self,
        sheet_id: &SheetId,
        compiled: &CompiledFormula,
        dependencies: &[Range],
    ) -> Result<ComputedValue, EvaluationError> {
        let resolver = CellResolver {
            evaluator: self,
            sheet_id,
        };
        let ctx = EvaluationContext::new(function_registry(), &self.model.config().globals, self.model);
        compiled.execute(dependencies, &resolver, &ctx)
    }

    fn reads_cache(&self, sheet_id: &SheetId) -> bool {
        self.target.as_ref() != Some(sheet_id) && self.cache.is_up_to_date(sheet_id)
    }

    fn state(&self, key: &CellKey) -> Option<CellState> {
        self.states.borrow().get(key).copied()
    }

    fn result(&self, key: &CellKey) -> Option<EvaluatedCell> {
        self.results.borrow().get(key).cloned()
    }

    fn set_computed(&self, key: CellKey, cell: EvaluatedCell) {
        self.results.borrow_mut().insert(key.clone(), cell);
        self.states.borrow_mut().insert(key, CellState::Computed);
    }

    /// Evaluated value of a position, computing it if needed
    fn compute_cell(&self, sheet_id: &SheetId, position: Position) -> EvaluatedCell {
        if self.reads_cache(sheet_id) {
            return self
                .cache
                .get(sheet_id, position)
                .cloned()
                .unwrap_or_else(EvaluatedCell::empty);
        }

        let key = (sheet_id.clone(), position);
        match self.state(&key) {
            Some(CellState::Computed) => {
                return self.result(&key).unwrap_or_else(EvaluatedCell::empty)
            }
            Some(CellState::ComputingWaitingRef) => {
                if self.started_before_look_back(&key) {
                    self.blocked.set(true);
                }
                return EvaluatedCell::from_error(EvaluationError::circular_dependency(), None);
            }
            None => {}
        }

        let Some(sheet) = self.model.sheet(sheet_id) else {
            return EvaluatedCell::from_error(EvaluationError::invalid_reference(), None);
        };
        let cell = match sheet.cell_id(position).and_then(|id| self.model.cell(id)) {
            Some(cell) if !cell.is_blank() => cell,
            blank => {
                // An array formula above or to the left may spill here
                self.compute_previous_cells(sheet, position, true);
                if let Some(spilled) = self.result(&key) {
                    return spilled;
                }
                return match blank {
                    Some(cell) => {
                        let evaluated = EvaluatedCell::Empty {
                            format: cell.format().map(str::to_string),
                        };
                        self.set_computed(key, evaluated.clone());
                        evaluated
                    }
                    None => EvaluatedCell::empty(),
                };
            }
        };

        let evaluated = match cell.content() {
            CellContent::Literal(_) => {
                EvaluatedCell::from_value(cell.literal_value().unwrap_or_default())
            }
            CellContent::BadExpression { error, .. } => {
                EvaluatedCell::from_error(error.clone(), cell.format().map(str::to_string))
            }
            CellContent::Formula {
                compiled,
                dependencies,
                ..
            } => {
                self.states
                    .borrow_mut()
                    .insert(key.clone(), CellState::ComputingWaitingRef);
                self.in_progress.borrow_mut().push(key.clone());
                let outer_blocked = self.blocked.replace(false);

                let evaluated = self.compute_formula(sheet, position, cell, compiled, dependencies);

                self.in_progress.borrow_mut().pop();
                let blocked = self.blocked.get();
                self.blocked.set(outer_blocked || blocked);
                if blocked {
                    // Computed from a placeholder: forget it, the main pass
                    // computes it again
                    self.states.borrow_mut().remove(&key);
                    return evaluated;
                }
                evaluated
            }
        };

        self.set_computed(key, evaluated.clone());
        evaluated
    }

    fn compute_formula(
        &self,
        sheet: &'m Sheet,
        position: Position,
        cell: &'m Cell,
        compiled: &CompiledFormula,
        dependencies: &[Range],
    ) -> EvaluatedCell {
        let resolver = CellResolver {
            evaluator: self,
            sheet_id: sheet.id(),
        };
        let id = cell.id();
        let ctx = EvaluationContext::new(function_registry(), &self.model.config().globals, self.model)
            .with_current_position(move || sheet.position_of(id));
        let own_format = cell.format();

        match compiled.execute(dependencies, &resolver, &ctx) {
            Ok(ComputedValue::Scalar(value)) => to_evaluated(Ok(value), own_format),
            Ok(ComputedValue::Matrix(_)) if self.blocked.get() => EvaluatedCell::empty(),
            Ok(ComputedValue::Matrix(cols)) => self.spill(sheet, position, own_format, dependencies, cols),
            Err(error) => EvaluatedCell::from_error(error, own_format.map(str::to_string)),
        }
    }

    /// Write an array result across the cells right and below its formula
    ///
    /// Either every cell of the block is written or none is, in which case
    /// the formula cell gets the error.
    fn spill(
        &self,
        sheet: &Sheet,
        anchor: Position,
        own_format: Option<&str>,
        dependencies: &[Range],
        cols: Vec<Vec<CellResult>>,
    ) -> EvaluatedCell {
        let width = cols.len() as u32;
        let height = cols.first().map_or(0, Vec::len) as u32;
        let zone = Zone::from_block(anchor, width, height);
        let fail = |error: EvaluationError| EvaluatedCell::from_error(error, own_format.map(str::to_string));

        let size = sheet.size();
        if zone.right as u32 >= size.num_cols || zone.bottom as u32 >= size.num_rows {
            return fail(EvaluationError::new(
                ErrorKind::OverwriteData,
                "Result couldn't be automatically expanded. Please insert more columns and rows.",
            ));
        }

        for position in zone.positions().filter(|&p| p != anchor) {
            let has_content = sheet
                .cell_id(position)
                .and_then(|id| self.model.cell(id))
                .map_or(false, |cell| !cell.is_blank());
            let has_value = self
                .result(&(sheet.id().clone(), position))
                .map_or(false, |cell| !cell.is_empty());
            if has_content || has_value {
                return fail(EvaluationError::new(
                    ErrorKind::OverwriteData,
                    format!(
                        "Array result was not expanded because it would overwrite data in {}.",
                        position
                    ),
                ));
            }
        }

        let reads_itself = dependencies.iter().any(|range| {
            range.is_valid()
                && range.sheet_id() == Some(sheet.id())
                && range.zone(self.model).overlaps(&zone)
        });
        if reads_itself {
            return fail(EvaluationError::circular_dependency());
        }

        let mut anchor_value = EvaluatedCell::empty();
        for (col, values) in cols.into_iter().enumerate() {
            for (row, value) in values.into_iter().enumerate() {
                let position = Position::new(anchor.col + col as u32, anchor.row + row as u32);
                if position == anchor {
                    anchor_value = to_evaluated(value, own_format);
                    continue;
                }
                let format = sheet
                    .cell_id(position)
                    .and_then(|id| self.model.cell(id))
                    .and_then(Cell::format);
                self.set_computed((sheet.id().clone(), position), to_evaluated(value, format));
            }
        }
        anchor_value
    }

    /// Compute the formula cells that could spill onto `position`
    ///
    /// Walks formula cells above and to the left, column by column from the
    /// closest. With `stop_when_filled`, stops as soon as something spilled
    /// onto `position`.
    fn compute_previous_cells(&self, sheet: &Sheet, position: Position, stop_when_filled: bool) {
        let target = (sheet.id().clone(), position);
        let depth = self.in_progress.borrow().len();
        self.look_backs.borrow_mut().push(depth);
        let outer_blocked = self.blocked.replace(false);

        for candidate in self.formula_positions(sheet).iter().copied() {
            if candidate.col > position.col || candidate.row > position.row || candidate == position {
                continue;
            }
            if self.state(&(sheet.id().clone(), candidate)).is_some() {
                continue;
            }
            self.compute_cell(sheet.id(), candidate);
            // A candidate left blocked simply did not spill yet
            self.blocked.set(false);
            if stop_when_filled && self.results.borrow().contains_key(&target) {
                break;
            }
        }

        self.look_backs.borrow_mut().pop();
        self.blocked.set(outer_blocked);
    }

    /// Whether `key` was already being computed when the innermost running
    /// look-back started
    fn started_before_look_back(&self, key: &CellKey) -> bool {
        let Some(&depth) = self.look_backs.borrow().last() else {
            return false;
        };
        self.in_progress.borrow()[..depth].contains(key)
    }

    fn formula_positions(&self, sheet: &Sheet) -> Rc<Vec<Position>> {
        if let Some(positions) = self.formula_positions.borrow().get(sheet.id()) {
            return Rc::clone(positions);
        }
        let mut positions: Vec<Position> = sheet
            .cells()
            .filter(|(_, id)| self.model.cell(*id).map_or(false, Cell::is_formula))
            .map(|(position, _)| position)
            .collect();
        positions.sort_unstable_by(|a, b| (b.col, b.row).cmp(&(a.col, a.row)));
        let positions = Rc::new(positions);
        self.formula_positions
            .borrow_mut()
            .insert(sheet.id().clone(), Rc::clone(&positions));
        positions
    }

    /// Value of a position as seen by a range read; `None` if nothing is there
    fn read(&self, sheet: &Sheet, position: Position) -> Option<CellResult> {
        if self.reads_cache(sheet.id()) {
            return self
                .cache
                .get(sheet.id(), position)
                .map(EvaluatedCell::to_value_and_format);
        }
        if sheet.cell_id(position).is_some() {
            return Some(self.compute_cell(sheet.id(), position).to_value_and_format());
        }
        self.result(&(sheet.id().clone(), position))
            .map(|cell| cell.to_value_and_format())
    }

    /// Sheet and zone a range points at
    fn locate(&self, range: &Range) -> Result<(&'m Sheet, Zone), EvaluationError> {
        if !range.is_valid() {
            return Err(EvaluationError::invalid_reference());
        }
        let sheet = range
            .sheet_id()
            .and_then(|id| self.model.sheet(id))
            .ok_or_else(EvaluationError::invalid_reference)?;
        Ok((sheet, range.zone(self.model)))
    }
}

/// Value of a formula result, the cell's own format winning
fn to_evaluated(value: CellResult, own_format: Option<&str>) -> EvaluatedCell {
    match value {
        Ok(mut value) => {
            if let Some(format) = own_format {
                value.format = Some(format.to_string());
            }
            EvaluatedCell::from_value(value)
        }
        Err(error) => EvaluatedCell::from_error(error, own_format.map(str::to_string)),
    }
}

/// Reads references on behalf of a formula of `sheet_id`
struct CellResolver<'e, 'm> {
    evaluator: &'e Evaluator<'m>,
    sheet_id: &'e SheetId,
}

impl ReferenceResolver for CellResolver<'_, '_> {
    fn reference(&self, range: &Range, position: Option<ArgPosition<'_>>, is_meta: bool) -> CellResult {
        let (sheet, zone) = self.evaluator.locate(range)?;

        if is_meta {
            let address = range.to_display_string(self.sheet_id, self.evaluator.model);
            return Ok(ValueAndFormat::new(Value::text(address), None));
        }

        if !zone.is_single_cell() {
            let message = match position {
                Some(ArgPosition { function, index }) => format!(
                    "Function {} expects the parameter {} to be a single value or a single cell reference, not a range.",
                    function, index
                ),
                None => "Expected a single value or a single cell reference, not a range.".to_string(),
            };
            return Err(EvaluationError::generic(message));
        }

        let target = zone
            .top_left()
            .filter(|&p| sheet.contains(p))
            .ok_or_else(EvaluationError::invalid_reference)?;
        self.evaluator
            .compute_cell(sheet.id(), target)
            .to_value_and_format()
    }

    fn range(&self, range: &Range) -> Result<RangeValues, EvaluationError> {
        let (sheet, zone) = self.evaluator.locate(range)?;
        let size = sheet.size();
        let bounds = Zone::new(0, 0, size.num_cols as i32 - 1, size.num_rows as i32 - 1);
        let Some(zone) = zone.intersection(&bounds) else {
            return Ok(Vec::new());
        };

        if !self.evaluator.reads_cache(sheet.id()) {
            let bottom_right = Position::new(zone.right as u32, zone.bottom as u32);
            self.evaluator
                .compute_previous_cells(sheet, bottom_right, false);
        }

        Ok((zone.left..=zone.right)
            .map(|col| {
                (zone.top..=zone.bottom)
                    .map(|row| self.evaluator.read(sheet, Position::new(col as u32, row as u32)))
                    .collect()
            })
            .collect())
    }
}
