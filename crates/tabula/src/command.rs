//! Commands accepted by [`crate::Model::dispatch`]

use tabula_core::{Dimension, HeaderIndex, InsertPosition, Position, SheetId, SheetSize};

/// Every change to a model goes through one of these
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a sheet, at the end unless `position` is given
    CreateSheet {
        sheet_id: SheetId,
        name: String,
        position: Option<usize>,
        /// Defaults to the configured sheet size
        size: Option<SheetSize>,
    },
    DeleteSheet {
        sheet_id: SheetId,
    },
    RenameSheet {
        sheet_id: SheetId,
        name: String,
    },
    /// Copy a sheet and its cells; formulas follow the copy
    DuplicateSheet {
        sheet_id: SheetId,
        new_sheet_id: SheetId,
        name: String,
    },
    ActivateSheet {
        sheet_id: SheetId,
    },
    /// Set the text and/or format of a cell
    ///
    /// `None` leaves that part unchanged; an empty format removes it. A cell
    /// left with no text and no format is deleted.
    UpdateCell {
        sheet_id: SheetId,
        position: Position,
        content: Option<String>,
        format: Option<String>,
    },
    ClearCell {
        sheet_id: SheetId,
        position: Position,
    },
    AddColumnsRows {
        sheet_id: SheetId,
        dimension: Dimension,
        base: HeaderIndex,
        quantity: HeaderIndex,
        position: InsertPosition,
    },
    RemoveColumnsRows {
        sheet_id: SheetId,
        dimension: Dimension,
        elements: Vec<HeaderIndex>,
    },
    /// Recompute one sheet, or every sheet
    EvaluateCells {
        sheet_id: Option<SheetId>,
    },
    /// Bind a name to a reference; the reference is read relative to `sheet_id`
    DefineName {
        name: String,
        sheet_id: SheetId,
        reference: String,
    },
    UndefineName {
        name: String,
    },
    /// Copy a cell onto another, shifting its relative references
    PasteCell {
        source_sheet_id: SheetId,
        source: Position,
        target_sheet_id: SheetId,
        target: Position,
    },
}

impl Command {
    /// Set the text of a cell, keeping its format
    pub fn update_content(sheet_id: &SheetId, position: Position, content: impl Into<String>) -> Self {
        Command::UpdateCell {
            sheet_id: sheet_id.clone(),
            position,
            content: Some(content.into()),
            format: None,
        }
    }

    /// Whether the command can change what any cell evaluates to
    pub fn invalidates_evaluation(&self) -> bool {
        !matches!(
            self,
            Command::ActivateSheet { .. } | Command::EvaluateCells { .. }
        )
    }
}
