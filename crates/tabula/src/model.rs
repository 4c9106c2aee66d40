//! The model: sheets, cells, names and their evaluation
//!
//! # Example
//!
//! ```rust
//! use tabula::{Command, Model, Position};
//!
//! let mut model = Model::new();
//! let sheet = model.active_sheet_id().clone();
//! model.dispatch(Command::update_content(&sheet, Position::new(0, 0), "10")).unwrap();
//! model.dispatch(Command::update_content(&sheet, Position::new(0, 1), "=A1*2")).unwrap();
//!
//! let a2 = model.evaluated_cell(&sheet, Position::new(0, 1));
//! assert_eq!(a2.formatted_value(), "20");
//! ```

use crate::cell::{Cell, CellContent, CellId};
use crate::command::Command;
use crate::config::ModelConfig;
use crate::evaluation::{EvaluationCache, Evaluator};
use crate::named_ranges::NamedRanges;
use crate::sheet::{Sheet, SheetObserver};
use ahash::AHashMap;
use std::cell::RefCell;
use tabula_core::{
    adapt_ranges_for_copy, ChangeType, Dimension, Error, HeaderIndex, InsertPosition, Position,
    Range, RangeAdapter, RangeChange, RangeProvider, Result, SheetId, SheetLookup, SheetSize,
    StructuralChange, INVALID_REFERENCE, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};
use tabula_formula::{CompiledFormula, GridReader};
use tracing::{trace, warn};

/// Cells of every sheet, by id
///
/// As a range provider, it adapts formula dependencies and remembers which
/// formulas need their text rewritten.
#[derive(Debug, Default, Clone)]
pub(crate) struct Cells {
    cells: AHashMap<CellId, Cell>,
    adapted: Vec<CellId>,
}

impl Cells {
    fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    fn insert(&mut self, cell: Cell) {
        self.cells.insert(cell.id(), cell);
    }

    fn remove(&mut self, id: CellId) -> Option<Cell> {
        self.cells.remove(&id)
    }

    fn take_adapted(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.adapted)
    }
}

impl RangeProvider for Cells {
    fn adapt_ranges(&mut self, apply: &dyn Fn(&Range) -> RangeChange, sheet_id: Option<&SheetId>) {
        for (id, cell) in self.cells.iter_mut() {
            let CellContent::Formula { dependencies, .. } = cell.content() else {
                continue;
            };

            let mut changed = false;
            let adapted: Vec<Range> = dependencies
                .iter()
                .map(|range| {
                    if sheet_id.is_some() && range.sheet_id() != sheet_id {
                        return range.clone();
                    }
                    let change = apply(range);
                    match change.change_type {
                        ChangeType::None => range.clone(),
                        // Ranges on a deleted sheet keep the sheet name so a
                        // later rename can bring them back
                        ChangeType::Remove if change.range.invalid_sheet_name().is_none() => {
                            changed = true;
                            change.range.with_invalid_xc(INVALID_REFERENCE)
                        }
                        _ => {
                            changed = true;
                            change.range
                        }
                    }
                })
                .collect();

            if changed {
                cell.set_dependencies(adapted);
                self.adapted.push(*id);
            }
        }
    }
}

/// A spreadsheet model
///
/// All edits go through [`Model::dispatch`]. Reads evaluate lazily: the
/// first read of a sheet after an edit runs a full evaluation pass for it.
/// The model is single-threaded.
#[derive(Debug)]
pub struct Model {
    config: ModelConfig,
    sheets: Vec<Sheet>,
    cells: Cells,
    next_cell_id: u64,
    active_sheet: SheetId,
    names: NamedRanges,
    evaluation: RefCell<EvaluationCache>,
}

impl Model {
    /// Create a model with one empty sheet
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    pub fn with_config(config: ModelConfig) -> Self {
        let sheet_id = SheetId::new(&config.first_sheet_name);
        let sheet = Sheet::new(
            sheet_id.clone(),
            config.first_sheet_name.clone(),
            config.default_sheet_size,
        );
        let mut evaluation = EvaluationCache::default();
        evaluation.on_sheet_created(&sheet_id);

        Self {
            config,
            sheets: vec![sheet],
            cells: Cells::default(),
            next_cell_id: 1,
            active_sheet: sheet_id,
            names: NamedRanges::new(),
            evaluation: RefCell::new(evaluation),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Apply a command
    ///
    /// The command is validated first; a rejected command leaves the model
    /// untouched.
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        trace!(?command, "dispatch");
        if command.invalidates_evaluation() {
            self.evaluation.get_mut().invalidate_all();
        }

        match command {
            Command::CreateSheet {
                sheet_id,
                name,
                position,
                size,
            } => self.create_sheet(sheet_id, name, position, size),
            Command::DeleteSheet { sheet_id } => self.delete_sheet(&sheet_id),
            Command::RenameSheet { sheet_id, name } => self.rename_sheet(&sheet_id, name),
            Command::DuplicateSheet {
                sheet_id,
                new_sheet_id,
                name,
            } => self.duplicate_sheet(&sheet_id, new_sheet_id, name),
            Command::ActivateSheet { sheet_id } => {
                self.require_sheet(&sheet_id)?;
                self.active_sheet = sheet_id.clone();
                self.ensure_evaluated(&sheet_id);
                Ok(())
            }
            Command::UpdateCell {
                sheet_id,
                position,
                content,
                format,
            } => self.update_cell(&sheet_id, position, content, format),
            Command::ClearCell { sheet_id, position } => {
                self.require_position(&sheet_id, position)?;
                self.remove_cell(&sheet_id, position);
                Ok(())
            }
            Command::AddColumnsRows {
                sheet_id,
                dimension,
                base,
                quantity,
                position,
            } => self.add_headers(sheet_id, dimension, base, quantity, position),
            Command::RemoveColumnsRows {
                sheet_id,
                dimension,
                elements,
            } => self.remove_headers(sheet_id, dimension, elements),
            Command::EvaluateCells { sheet_id } => {
                let targets = match sheet_id {
                    Some(sheet_id) => {
                        self.require_sheet(&sheet_id)?;
                        vec![sheet_id]
                    }
                    None => self.sheet_ids(),
                };
                for sheet_id in &targets {
                    self.evaluation.get_mut().invalidate(sheet_id);
                    self.ensure_evaluated(sheet_id);
                }
                Ok(())
            }
            Command::DefineName {
                name,
                sheet_id,
                reference,
            } => {
                self.require_sheet(&sheet_id)?;
                let range = Range::from_sheet_xc(&sheet_id, &reference, &*self);
                if !range.is_valid() {
                    return Err(Error::InvalidRange(reference));
                }
                self.names.define(&name, range)
            }
            Command::UndefineName { name } => self
                .names
                .undefine(&name)
                .map(|_| ())
                .ok_or(Error::InvalidName(name)),
            Command::PasteCell {
                source_sheet_id,
                source,
                target_sheet_id,
                target,
            } => self.paste_cell(&source_sheet_id, source, &target_sheet_id, target),
        }
    }

    // ===== Sheets =====

    pub fn sheet(&self, sheet_id: &SheetId) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id() == sheet_id)
    }

    fn sheet_mut(&mut self, sheet_id: &SheetId) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.id() == sheet_id)
    }

    /// Sheet ids, in sheet order
    pub fn sheet_ids(&self) -> Vec<SheetId> {
        self.sheets.iter().map(|s| s.id().clone()).collect()
    }

    pub fn active_sheet_id(&self) -> &SheetId {
        &self.active_sheet
    }

    fn require_sheet(&self, sheet_id: &SheetId) -> Result<&Sheet> {
        self.sheet(sheet_id)
            .ok_or_else(|| Error::SheetNotFound(sheet_id.to_string()))
    }

    fn require_position(&self, sheet_id: &SheetId, position: Position) -> Result<&Sheet> {
        let sheet = self.require_sheet(sheet_id)?;
        let size = sheet.size();
        if position.col >= size.num_cols {
            return Err(Error::ColumnOutOfBounds(position.col, size.num_cols));
        }
        if position.row >= size.num_rows {
            return Err(Error::RowOutOfBounds(position.row, size.num_rows));
        }
        Ok(sheet)
    }

    /// Validate a sheet name, optionally excluding a sheet from duplicate check
    fn validate_sheet_name(&self, name: &str, exclude: Option<&SheetId>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        let duplicate = self
            .sheets
            .iter()
            .any(|s| Some(s.id()) != exclude && s.name().to_lowercase() == name.to_lowercase());
        if duplicate {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }

    fn create_sheet(
        &mut self,
        sheet_id: SheetId,
        name: String,
        position: Option<usize>,
        size: Option<SheetSize>,
    ) -> Result<()> {
        if self.sheet(&sheet_id).is_some() {
            return Err(Error::InvalidCommand(format!("Sheet id {} is already used", sheet_id)));
        }
        self.validate_sheet_name(&name, None)?;
        let size = size.unwrap_or(self.config.default_sheet_size);
        if size.num_cols > MAX_COLS || size.num_rows > MAX_ROWS {
            return Err(Error::InvalidCommand(format!(
                "Sheet size {}x{} exceeds the maximum",
                size.num_cols, size.num_rows
            )));
        }

        let index = position.unwrap_or(self.sheets.len()).min(self.sheets.len());
        self.sheets
            .insert(index, Sheet::new(sheet_id.clone(), name, size));
        self.evaluation.get_mut().on_sheet_created(&sheet_id);
        Ok(())
    }

    fn delete_sheet(&mut self, sheet_id: &SheetId) -> Result<()> {
        let sheet = self.require_sheet(sheet_id)?;
        if self.sheets.len() == 1 {
            return Err(Error::InvalidCommand("Cannot delete the only sheet".into()));
        }
        let sheet_name = sheet.name().to_string();

        self.adapt_ranges(StructuralChange::DeleteSheet {
            sheet_id: sheet_id.clone(),
            sheet_name,
        });

        if let Some(index) = self.sheets.iter().position(|s| s.id() == sheet_id) {
            let sheet = self.sheets.remove(index);
            for (_, id) in sheet.cells() {
                self.cells.remove(id);
            }
        }
        self.evaluation.get_mut().on_sheet_deleted(sheet_id);
        if &self.active_sheet == sheet_id {
            if let Some(first) = self.sheets.first() {
                self.active_sheet = first.id().clone();
            }
        }

        self.rewrite_adapted_formulas();
        Ok(())
    }

    fn rename_sheet(&mut self, sheet_id: &SheetId, name: String) -> Result<()> {
        self.require_sheet(sheet_id)?;
        self.validate_sheet_name(&name, Some(sheet_id))?;
        if let Some(sheet) = self.sheet_mut(sheet_id) {
            sheet.set_name(name.clone());
        }

        self.adapt_ranges(StructuralChange::RenameSheet {
            sheet_id: sheet_id.clone(),
            new_name: name,
        });
        self.rewrite_adapted_formulas();
        Ok(())
    }

    fn duplicate_sheet(&mut self, sheet_id: &SheetId, new_sheet_id: SheetId, name: String) -> Result<()> {
        let source = self.require_sheet(sheet_id)?;
        let size = source.size();
        let copies: Vec<(Position, CellId)> = source.cells().collect();
        let index = self
            .sheets
            .iter()
            .position(|s| s.id() == sheet_id)
            .map_or(self.sheets.len(), |i| i + 1);

        self.create_sheet(new_sheet_id.clone(), name, Some(index), Some(size))?;
        self.evaluation
            .get_mut()
            .on_sheet_duplicated(sheet_id, &new_sheet_id);

        for (position, id) in copies {
            if let Some((content, format)) = self.copied_content(id, 0, 0, &new_sheet_id) {
                let cell = self.new_cell(content, format);
                self.place_cell(&new_sheet_id, position, cell);
            }
        }
        Ok(())
    }

    // ===== Cells =====

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Cell at a position
    pub fn cell_at(&self, sheet_id: &SheetId, position: Position) -> Option<&Cell> {
        self.sheet(sheet_id)?
            .cell_id(position)
            .and_then(|id| self.cells.get(id))
    }

    /// Sheet and position of a cell
    pub fn cell_position(&self, id: CellId) -> Option<(SheetId, Position)> {
        self.sheets
            .iter()
            .find_map(|s| s.position_of(id).map(|p| (s.id().clone(), p)))
    }

    fn update_cell(
        &mut self,
        sheet_id: &SheetId,
        position: Position,
        content: Option<String>,
        format: Option<String>,
    ) -> Result<()> {
        self.require_position(sheet_id, position)?;
        let existing = self.cell_at(sheet_id, position);

        let text = content.unwrap_or_else(|| existing.map(|c| c.text().to_string()).unwrap_or_default());
        let format = match format {
            Some(format) if format.is_empty() => None,
            Some(format) => Some(format),
            None => existing.and_then(|c| c.format().map(str::to_string)),
        };

        if text.is_empty() && format.is_none() {
            self.remove_cell(sheet_id, position);
            return Ok(());
        }

        let content = self.compile_content(sheet_id, text);
        match existing.map(Cell::id) {
            Some(id) => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.set_content(content);
                    cell.set_format(format);
                }
            }
            None => {
                let cell = self.new_cell(content, format);
                self.place_cell(sheet_id, position, cell);
            }
        }
        Ok(())
    }

    fn new_cell(&mut self, content: CellContent, format: Option<String>) -> Cell {
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        Cell::new(id, content, format)
    }

    fn place_cell(&mut self, sheet_id: &SheetId, position: Position, cell: Cell) {
        let id = cell.id();
        self.cells.insert(cell);
        let replaced = self
            .sheet_mut(sheet_id)
            .and_then(|sheet| sheet.place(position, id));
        if let Some(replaced) = replaced {
            self.cells.remove(replaced);
        }
    }

    fn remove_cell(&mut self, sheet_id: &SheetId, position: Position) {
        if let Some(id) = self.sheet_mut(sheet_id).and_then(|sheet| sheet.take(position)) {
            self.cells.remove(id);
        }
    }

    /// Turn cell text into content, compiling formulas
    fn compile_content(&self, sheet_id: &SheetId, text: String) -> CellContent {
        if !text.starts_with('=') {
            return CellContent::Literal(text);
        }
        match CompiledFormula::compile(&text) {
            Ok(compiled) => {
                let dependencies = compiled
                    .dependencies()
                    .iter()
                    .map(|xc| Range::from_sheet_xc(sheet_id, xc, self))
                    .collect();
                CellContent::Formula {
                    text,
                    compiled,
                    dependencies,
                }
            }
            Err(error) => {
                warn!(sheet = %sheet_id, formula = %text, %error, "formula failed to compile");
                CellContent::BadExpression {
                    text,
                    error: error.into(),
                }
            }
        }
    }

    /// Content and format of a cell copied elsewhere, with references shifted by the offset
    fn copied_content(
        &self,
        id: CellId,
        offset_x: HeaderIndex,
        offset_y: HeaderIndex,
        target: &SheetId,
    ) -> Option<(CellContent, Option<String>)> {
        let source = self.cells.get(id)?;
        let content = match source.content() {
            CellContent::Formula {
                compiled,
                dependencies,
                ..
            } => {
                let texts: Vec<String> = adapt_ranges_for_copy(dependencies, offset_x, offset_y, target)
                    .iter()
                    .map(|range| range.to_display_string(target, self))
                    .collect();
                self.compile_content(target, compiled.render(&texts))
            }
            other => other.clone(),
        };
        Some((content, source.format().map(str::to_string)))
    }

    fn paste_cell(
        &mut self,
        source_sheet_id: &SheetId,
        source: Position,
        target_sheet_id: &SheetId,
        target: Position,
    ) -> Result<()> {
        self.require_position(source_sheet_id, source)?;
        self.require_position(target_sheet_id, target)?;

        let offset_x = target.col as HeaderIndex - source.col as HeaderIndex;
        let offset_y = target.row as HeaderIndex - source.row as HeaderIndex;
        let copy = self
            .cell_at(source_sheet_id, source)
            .and_then(|cell| self.copied_content(cell.id(), offset_x, offset_y, target_sheet_id));
        match copy {
            Some((content, format)) => {
                let cell = self.new_cell(content, format);
                self.place_cell(target_sheet_id, target, cell);
            }
            None => self.remove_cell(target_sheet_id, target),
        }
        Ok(())
    }

    // ===== Structure =====

    fn add_headers(
        &mut self,
        sheet_id: SheetId,
        dimension: Dimension,
        base: HeaderIndex,
        quantity: HeaderIndex,
        position: InsertPosition,
    ) -> Result<()> {
        let size = self.require_sheet(&sheet_id)?.size();
        let count = header_count(size, dimension);
        if quantity <= 0 {
            return Err(Error::InvalidCommand("Cannot add zero headers".into()));
        }
        if base < 0 || base >= count {
            return Err(out_of_bounds(dimension, base, count));
        }

        self.adapt_ranges(StructuralChange::AddColumnsRows {
            sheet_id: sheet_id.clone(),
            dimension,
            base,
            quantity,
            position,
        });

        let at = match position {
            InsertPosition::Before => base,
            InsertPosition::After => base + 1,
        };
        if let Some(sheet) = self.sheet_mut(&sheet_id) {
            sheet.insert_headers(dimension, at, quantity);
        }
        self.rewrite_adapted_formulas();
        Ok(())
    }

    fn remove_headers(&mut self, sheet_id: SheetId, dimension: Dimension, elements: Vec<HeaderIndex>) -> Result<()> {
        let size = self.require_sheet(&sheet_id)?.size();
        let count = header_count(size, dimension);
        if let Some(&bad) = elements.iter().find(|&&e| e < 0 || e >= count) {
            return Err(out_of_bounds(dimension, bad, count));
        }
        let mut distinct = elements.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.is_empty() || distinct.len() as HeaderIndex >= count {
            return Err(Error::InvalidCommand(
                "Cannot remove every column or row of a sheet".into(),
            ));
        }

        self.adapt_ranges(StructuralChange::RemoveColumnsRows {
            sheet_id: sheet_id.clone(),
            dimension,
            elements: distinct.clone(),
        });

        let dropped = self
            .sheet_mut(&sheet_id)
            .map(|sheet| sheet.remove_headers(dimension, &distinct))
            .unwrap_or_default();
        for id in dropped {
            self.cells.remove(id);
        }
        self.rewrite_adapted_formulas();
        Ok(())
    }

    /// Run a structural change through every range provider
    fn adapt_ranges(&mut self, change: StructuralChange) {
        let adapter = RangeAdapter::new(change, &*self);
        adapter.notify(&mut [
            &mut self.cells as &mut dyn RangeProvider,
            &mut self.names as &mut dyn RangeProvider,
        ]);
    }

    /// Rewrite the text of formulas whose ranges were adapted, and recompile them
    fn rewrite_adapted_formulas(&mut self) {
        for id in self.cells.take_adapted() {
            let Some((sheet_id, _)) = self.cell_position(id) else {
                continue;
            };
            let Some(CellContent::Formula {
                compiled,
                dependencies,
                ..
            }) = self.cells.get(id).map(Cell::content)
            else {
                continue;
            };

            let texts: Vec<String> = dependencies
                .iter()
                .map(|range| range.to_display_string(&sheet_id, self))
                .collect();
            let text = compiled.render(&texts);
            let content = self.compile_content(&sheet_id, text);
            if let Some(cell) = self.cells.get_mut(id) {
                cell.set_content(content);
            }
        }
    }

    // ===== Evaluation =====

    /// Run an evaluation pass for a sheet unless its results are current
    pub(crate) fn ensure_evaluated(&self, sheet_id: &SheetId) {
        if self.evaluation.borrow().is_up_to_date(sheet_id) || self.sheet(sheet_id).is_none() {
            return;
        }
        let results = {
            let cache = self.evaluation.borrow();
            let evaluator = Evaluator::new(self, &cache, Some(sheet_id.clone()));
            evaluator.run_pass()
        };
        self.evaluation.borrow_mut().store(sheet_id, results);
    }

    pub(crate) fn evaluation(&self) -> &RefCell<EvaluationCache> {
        &self.evaluation
    }

    pub(crate) fn names(&self) -> &NamedRanges {
        &self.names
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetLookup for Model {
    fn sheet_size(&self, sheet_id: &SheetId) -> Option<SheetSize> {
        self.sheet(sheet_id).map(Sheet::size)
    }

    fn sheet_name(&self, sheet_id: &SheetId) -> Option<&str> {
        self.sheet(sheet_id).map(Sheet::name)
    }

    fn sheet_id_by_name(&self, name: &str) -> Option<SheetId> {
        let name = name.to_lowercase();
        self.sheets
            .iter()
            .find(|s| s.name().to_lowercase() == name)
            .map(|s| s.id().clone())
    }
}

impl GridReader for Model {
    fn named_range(&self, name: &str) -> Option<Range> {
        self.names.get(name).map(|named| named.range.clone())
    }
}

fn header_count(size: SheetSize, dimension: Dimension) -> HeaderIndex {
    match dimension {
        Dimension::Col => size.num_cols as HeaderIndex,
        Dimension::Row => size.num_rows as HeaderIndex,
    }
}

fn out_of_bounds(dimension: Dimension, index: HeaderIndex, count: HeaderIndex) -> Error {
    match dimension {
        Dimension::Col => Error::ColumnOutOfBounds(index.max(0) as u32, count as u32),
        Dimension::Row => Error::RowOutOfBounds(index.max(0) as u32, count as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn xc(s: &str) -> Position {
        Position::parse(s).unwrap()
    }

    #[test]
    fn test_new_model_has_one_sheet() {
        let model = Model::new();
        assert_eq!(model.sheet_ids(), vec![SheetId::new("Sheet1")]);
        assert_eq!(model.sheet_size(model.active_sheet_id()), Some(SheetSize::new(26, 100)));
    }

    #[test]
    fn test_update_cell_keeps_format() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        model
            .dispatch(Command::UpdateCell {
                sheet_id: s1.clone(),
                position: xc("A1"),
                content: Some("1".into()),
                format: Some("0.00".into()),
            })
            .unwrap();
        model.dispatch(Command::update_content(&s1, xc("A1"), "2")).unwrap();

        let cell = model.cell_at(&s1, xc("A1")).unwrap();
        assert_eq!(cell.text(), "2");
        assert_eq!(cell.format(), Some("0.00"));
    }

    #[test]
    fn test_empty_update_removes_cell() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        model.dispatch(Command::update_content(&s1, xc("B2"), "x")).unwrap();
        model.dispatch(Command::update_content(&s1, xc("B2"), "")).unwrap();
        assert!(model.cell_at(&s1, xc("B2")).is_none());
        assert_eq!(model.sheet(&s1).map(Sheet::cell_count), Some(0));
    }

    #[test]
    fn test_out_of_bounds_update() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        let err = model
            .dispatch(Command::update_content(&s1, Position::new(26, 0), "x"))
            .unwrap_err();
        assert_eq!(err, Error::ColumnOutOfBounds(26, 26));
    }

    #[test]
    fn test_sheet_name_validation() {
        let mut model = Model::new();
        let create = |name: &str| Command::CreateSheet {
            sheet_id: SheetId::new("s2"),
            name: name.into(),
            position: None,
            size: None,
        };
        assert!(matches!(model.dispatch(create("sheet1")), Err(Error::DuplicateSheetName(_))));
        assert!(matches!(model.dispatch(create("a/b")), Err(Error::InvalidSheetName(_))));
        assert!(matches!(model.dispatch(create("")), Err(Error::InvalidSheetName(_))));
        model.dispatch(create("Data")).unwrap();
        assert_eq!(model.sheet_id_by_name("DATA"), Some(SheetId::new("s2")));
    }

    #[test]
    fn test_cannot_delete_last_sheet() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        assert!(matches!(
            model.dispatch(Command::DeleteSheet { sheet_id: s1 }),
            Err(Error::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_bad_formula_is_kept_as_text() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        model.dispatch(Command::update_content(&s1, xc("A1"), "=1+")).unwrap();
        let cell = model.cell_at(&s1, xc("A1")).unwrap();
        assert!(matches!(cell.content(), CellContent::BadExpression { .. }));
        assert_eq!(cell.text(), "=1+");
    }

    #[test]
    fn test_remove_headers_validation() {
        let mut model = Model::new();
        let s1 = model.active_sheet_id().clone();
        let err = model
            .dispatch(Command::RemoveColumnsRows {
                sheet_id: s1.clone(),
                dimension: Dimension::Row,
                elements: vec![100],
            })
            .unwrap_err();
        assert_eq!(err, Error::RowOutOfBounds(100, 100));

        let all: Vec<HeaderIndex> = (0..26).collect();
        assert!(matches!(
            model.dispatch(Command::RemoveColumnsRows {
                sheet_id: s1,
                dimension: Dimension::Col,
                elements: all,
            }),
            Err(Error::InvalidCommand(_))
        ));
    }
}
