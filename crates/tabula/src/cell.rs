//! Raw cells, as written by the user

use std::fmt;
use tabula_core::{EvaluationError, Range, ValueAndFormat};
use tabula_formula::CompiledFormula;

/// Stable identity of a cell
///
/// The id survives structural edits; the position of a cell is looked up
/// in its sheet, never stored on the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell-{}", self.0)
    }
}

/// What a cell holds
#[derive(Debug, Clone)]
pub enum CellContent {
    /// Plain text; its value comes from literal parsing
    Literal(String),
    /// A formula that compiled, with its references resolved to ranges
    Formula {
        text: String,
        compiled: CompiledFormula,
        /// Same order as the compiled dependency texts
        dependencies: Vec<Range>,
    },
    /// A formula that failed to compile
    BadExpression { text: String, error: EvaluationError },
}

/// A cell of the grid
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    content: CellContent,
    format: Option<String>,
}

impl Cell {
    pub(crate) fn new(id: CellId, content: CellContent, format: Option<String>) -> Self {
        Self { id, content, format }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub(crate) fn set_content(&mut self, content: CellContent) {
        self.content = content;
    }

    /// Format set on the cell itself
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub(crate) fn set_format(&mut self, format: Option<String>) {
        self.format = format;
    }

    /// Text as typed, formulas included
    pub fn text(&self) -> &str {
        match &self.content {
            CellContent::Literal(text)
            | CellContent::Formula { text, .. }
            | CellContent::BadExpression { text, .. } => text,
        }
    }

    pub fn is_formula(&self) -> bool {
        !matches!(self.content, CellContent::Literal(_))
    }

    /// A cell with no text, kept only for its format
    pub fn is_blank(&self) -> bool {
        matches!(&self.content, CellContent::Literal(text) if text.is_empty())
    }

    /// Ranges the cell's formula depends on
    pub fn dependencies(&self) -> &[Range] {
        match &self.content {
            CellContent::Formula { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    /// Replace the ranges of a formula; other cells are left alone
    pub(crate) fn set_dependencies(&mut self, ranges: Vec<Range>) {
        if let CellContent::Formula { dependencies, .. } = &mut self.content {
            *dependencies = ranges;
        }
    }

    /// Value of a literal cell; the cell's own format wins over the parsed one
    pub(crate) fn literal_value(&self) -> Option<ValueAndFormat> {
        match &self.content {
            CellContent::Literal(text) => {
                let mut value = ValueAndFormat::parse_literal(text);
                if self.format.is_some() {
                    value.format = self.format.clone();
                }
                Some(value)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::Value;

    #[test]
    fn test_literal_value_uses_own_format() {
        let cell = Cell::new(CellId(1), CellContent::Literal("12%".into()), None);
        assert_eq!(
            cell.literal_value(),
            Some(ValueAndFormat::new(0.12, Some("0%".into())))
        );

        let cell = Cell::new(
            CellId(2),
            CellContent::Literal("12%".into()),
            Some("0.00".into()),
        );
        assert_eq!(cell.literal_value().map(|v| v.format), Some(Some("0.00".into())));
    }

    #[test]
    fn test_blank_cell() {
        let cell = Cell::new(CellId(1), CellContent::Literal(String::new()), Some("0%".into()));
        assert!(cell.is_blank());
        assert!(!cell.is_formula());
        assert_eq!(cell.literal_value().map(|v| v.value), Some(Value::Empty));
    }
}
