//! Cell value types
//!
//! This module contains:
//! - [`Value`] - A scalar produced by a literal or a formula
//! - [`EvaluationError`] - A typed cell-level failure
//! - [`EvaluatedCell`] - The computed state of one cell after a pass

mod error;
mod evaluated;
mod value;

pub use error::{ErrorKind, EvaluationError, Severity};
pub use evaluated::{Align, CellValueType, EvaluatedCell};
pub use value::{SharedString, Value, ValueAndFormat};
