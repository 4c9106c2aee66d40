//! Per-sheet cell placement

use crate::cell::CellId;
use ahash::AHashMap;
use std::collections::BTreeMap;
use tabula_core::{Dimension, HeaderIndex, Position, SheetId, SheetSize};

/// Lifecycle hooks for state kept per sheet outside of [`Sheet`]
pub trait SheetObserver {
    fn on_sheet_created(&mut self, _sheet_id: &SheetId) {}

    fn on_sheet_deleted(&mut self, _sheet_id: &SheetId) {}

    fn on_sheet_duplicated(&mut self, _from: &SheetId, _to: &SheetId) {}
}

/// A sheet: its name, its size and where its cells are
///
/// Cells are stored in the model by id; the sheet only maps positions to
/// ids, keyed row-major so iteration follows reading order.
#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    name: String,
    size: SheetSize,
    /// (row, col) -> cell
    cells: BTreeMap<(u32, u32), CellId>,
    positions: AHashMap<CellId, Position>,
}

impl Sheet {
    pub(crate) fn new(id: SheetId, name: String, size: SheetSize) -> Self {
        Self {
            id,
            name,
            size,
            cells: BTreeMap::new(),
            positions: AHashMap::new(),
        }
    }

    pub fn id(&self) -> &SheetId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn size(&self) -> SheetSize {
        self.size
    }

    /// Check that a position is inside the sheet
    pub fn contains(&self, position: Position) -> bool {
        position.col < self.size.num_cols && position.row < self.size.num_rows
    }

    /// Id of the cell at a position
    pub fn cell_id(&self, position: Position) -> Option<CellId> {
        self.cells.get(&(position.row, position.col)).copied()
    }

    /// Position of a cell of this sheet
    pub fn position_of(&self, id: CellId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Every cell with its position, row by row
    pub fn cells(&self) -> impl Iterator<Item = (Position, CellId)> + '_ {
        self.cells
            .iter()
            .map(|(&(row, col), &id)| (Position::new(col, row), id))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Put a cell at a position, returning the cell it replaces
    pub(crate) fn place(&mut self, position: Position, id: CellId) -> Option<CellId> {
        let previous = self.cells.insert((position.row, position.col), id);
        if let Some(previous) = previous {
            self.positions.remove(&previous);
        }
        self.positions.insert(id, position);
        previous
    }

    pub(crate) fn take(&mut self, position: Position) -> Option<CellId> {
        let id = self.cells.remove(&(position.row, position.col))?;
        self.positions.remove(&id);
        Some(id)
    }

    /// Insert `quantity` headers starting at index `at`
    pub(crate) fn insert_headers(&mut self, dimension: Dimension, at: HeaderIndex, quantity: HeaderIndex) {
        let at = at.max(0) as u32;
        let quantity = quantity.max(0) as u32;
        match dimension {
            Dimension::Col => self.size.num_cols += quantity,
            Dimension::Row => self.size.num_rows += quantity,
        }
        self.relocate(|mut position| {
            let index = header(&mut position, dimension);
            if *index >= at {
                *index += quantity;
            }
            Some(position)
        });
    }

    /// Delete headers, returning the cells that were on them
    pub(crate) fn remove_headers(&mut self, dimension: Dimension, elements: &[HeaderIndex]) -> Vec<CellId> {
        let mut removed_indices: Vec<u32> = elements
            .iter()
            .filter(|&&e| e >= 0)
            .map(|&e| e as u32)
            .collect();
        removed_indices.sort_unstable();
        removed_indices.dedup();

        let count = removed_indices.len() as u32;
        match dimension {
            Dimension::Col => self.size.num_cols = self.size.num_cols.saturating_sub(count),
            Dimension::Row => self.size.num_rows = self.size.num_rows.saturating_sub(count),
        }

        let mut dropped = Vec::new();
        let cells = std::mem::take(&mut self.cells);
        self.positions.clear();
        for ((row, col), id) in cells {
            let mut position = Position::new(col, row);
            let index = header(&mut position, dimension);
            if removed_indices.binary_search(index).is_ok() {
                dropped.push(id);
                continue;
            }
            let shift = removed_indices.partition_point(|&r| r < *index) as u32;
            *index -= shift;
            self.place(position, id);
        }
        dropped
    }

    fn relocate(&mut self, mut f: impl FnMut(Position) -> Option<Position>) {
        let cells = std::mem::take(&mut self.cells);
        self.positions.clear();
        for ((row, col), id) in cells {
            if let Some(position) = f(Position::new(col, row)) {
                self.place(position, id);
            }
        }
    }
}

fn header(position: &mut Position, dimension: Dimension) -> &mut u32 {
    match dimension {
        Dimension::Col => &mut position.col,
        Dimension::Row => &mut position.row,
    }
}
