//! # tabula
//!
//! A lazy, cycle-safe spreadsheet recalculation engine.
//!
//! A [`Model`] holds sheets of raw cells (literals and formulas) and
//! computes, on demand, the evaluated value of every cell. Edits are
//! [`Command`]s; structural edits (inserting or removing columns and rows,
//! renaming or deleting sheets) rewrite every formula and defined name so
//! they keep pointing at the same cells.
//!
//! ## Features
//!
//! - Pull-based evaluation: a sheet is recomputed the first time it is read
//!   after an edit
//! - Circular references become `#CYCLE` errors instead of hanging
//! - Array formulas spill across neighbouring cells, all or nothing
//! - References follow inserted and removed columns and rows
//! - Defined names, sheet duplication and cell copy/paste
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut model = Model::new();
//! let sheet = model.active_sheet_id().clone();
//!
//! model.set_cell_content(&sheet, "A1", "10").unwrap();
//! model.set_cell_content(&sheet, "A2", "32").unwrap();
//! model.set_cell_content(&sheet, "A3", "=SUM(A1:A2)").unwrap();
//! assert_eq!(model.evaluated_cell(&sheet, Position::parse("A3").unwrap()).value(), Value::Number(42.0));
//!
//! // Inserting a row above moves the formula and its references
//! model
//!     .dispatch(Command::AddColumnsRows {
//!         sheet_id: sheet.clone(),
//!         dimension: Dimension::Row,
//!         base: 0,
//!         quantity: 1,
//!         position: InsertPosition::Before,
//!     })
//!     .unwrap();
//! assert_eq!(model.cell_text(&sheet, "A4").unwrap(), Some("=SUM(A2:A3)"));
//! ```

pub mod cell;
pub mod command;
pub mod config;
pub(crate) mod evaluation;
pub mod getters;
pub mod model;
pub mod named_ranges;
pub mod prelude;
pub mod sheet;

pub use cell::{Cell, CellContent, CellId};
pub use command::Command;
pub use config::ModelConfig;
pub use model::Model;
pub use named_ranges::{NamedRange, NamedRanges};
pub use sheet::{Sheet, SheetObserver};

// Re-export core types
pub use tabula_core::{
    CellValueType, Dimension, Error, ErrorKind, EvaluatedCell, EvaluationError, HeaderIndex,
    InsertPosition, Position, Range, Result, SheetId, SheetLookup, SheetSize, UnboundedZone,
    Value, ValueAndFormat, Zone,
};

// Re-export formula types
pub use tabula_formula::{function_registry, CompiledFormula, ComputedValue, FormulaError};
