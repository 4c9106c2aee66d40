//! Evaluated state of a cell

use super::{EvaluationError, SharedString, Value, ValueAndFormat};
use crate::format::format_number;

/// Type tag of an evaluated cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValueType {
    Number,
    Text,
    Boolean,
    Empty,
    Error,
}

/// Default horizontal alignment of a cell's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// The computed state of one cell
///
/// Produced fresh by every evaluation pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedCell {
    Number {
        value: f64,
        format: Option<String>,
    },
    Text {
        value: SharedString,
        format: Option<String>,
    },
    Boolean {
        value: bool,
        format: Option<String>,
    },
    Empty {
        format: Option<String>,
    },
    Error {
        error: EvaluationError,
        format: Option<String>,
    },
}

impl EvaluatedCell {
    /// An empty cell with no format
    pub fn empty() -> Self {
        EvaluatedCell::Empty { format: None }
    }

    /// Build from a value and its format
    pub fn from_value(value: ValueAndFormat) -> Self {
        let format = value.format;
        match value.value {
            Value::Number(value) => EvaluatedCell::Number { value, format },
            Value::Text(value) => EvaluatedCell::Text { value, format },
            Value::Boolean(value) => EvaluatedCell::Boolean { value, format },
            Value::Empty => EvaluatedCell::Empty { format },
        }
    }

    /// Build an error cell
    pub fn from_error(error: EvaluationError, format: Option<String>) -> Self {
        EvaluatedCell::Error { error, format }
    }

    pub fn value_type(&self) -> CellValueType {
        match self {
            EvaluatedCell::Number { .. } => CellValueType::Number,
            EvaluatedCell::Text { .. } => CellValueType::Text,
            EvaluatedCell::Boolean { .. } => CellValueType::Boolean,
            EvaluatedCell::Empty { .. } => CellValueType::Empty,
            EvaluatedCell::Error { .. } => CellValueType::Error,
        }
    }

    /// The raw value; an error reads as its code
    pub fn value(&self) -> Value {
        match self {
            EvaluatedCell::Number { value, .. } => Value::Number(*value),
            EvaluatedCell::Text { value, .. } => Value::Text(value.clone()),
            EvaluatedCell::Boolean { value, .. } => Value::Boolean(*value),
            EvaluatedCell::Empty { .. } => Value::Empty,
            EvaluatedCell::Error { error, .. } => Value::text(error.code()),
        }
    }

    pub fn format(&self) -> Option<&str> {
        match self {
            EvaluatedCell::Number { format, .. }
            | EvaluatedCell::Text { format, .. }
            | EvaluatedCell::Boolean { format, .. }
            | EvaluatedCell::Empty { format }
            | EvaluatedCell::Error { format, .. } => format.as_deref(),
        }
    }

    pub fn error(&self) -> Option<&EvaluationError> {
        match self {
            EvaluatedCell::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvaluatedCell::Error { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, EvaluatedCell::Empty { .. })
    }

    /// Value and format, or the error when the cell is in error
    pub fn to_value_and_format(&self) -> Result<ValueAndFormat, EvaluationError> {
        match self {
            EvaluatedCell::Error { error, .. } => Err(error.clone()),
            _ => Ok(ValueAndFormat {
                value: self.value(),
                format: self.format().map(str::to_string),
            }),
        }
    }

    /// Display string of the cell
    pub fn formatted_value(&self) -> String {
        match self {
            EvaluatedCell::Number { value, format } => format_number(*value, format.as_deref()),
            EvaluatedCell::Text { value, .. } => value.to_string(),
            EvaluatedCell::Boolean { value, .. } => bool_text(*value).to_string(),
            EvaluatedCell::Empty { .. } => String::new(),
            EvaluatedCell::Error { error, .. } => error.code().to_string(),
        }
    }

    pub fn default_align(&self) -> Align {
        match self {
            EvaluatedCell::Number { .. } => Align::Right,
            EvaluatedCell::Boolean { .. } | EvaluatedCell::Error { .. } => Align::Center,
            EvaluatedCell::Text { .. } | EvaluatedCell::Empty { .. } => Align::Left,
        }
    }

    /// Whether an automatic SUM should include this cell
    pub fn is_auto_summable(&self) -> bool {
        matches!(
            self,
            EvaluatedCell::Number { .. } | EvaluatedCell::Empty { .. }
        )
    }

    /// Text put in the editor when the cell is edited as a value
    pub fn composer_content(&self) -> String {
        match self {
            EvaluatedCell::Number { value, format } => match format.as_deref() {
                Some(f) if f.ends_with('%') => format!("{}%", format_number(value * 100.0, None)),
                _ => format_number(*value, None),
            },
            _ => self.formatted_value(),
        }
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}
