//! # tabula-core
//!
//! Core data structures for the tabula recalculation engine.
//!
//! This crate provides the pieces every other layer builds on:
//! - [`Zone`] and [`UnboundedZone`] - Rectangular header spans, optionally open-ended
//! - [`Range`] - A zone bound to a sheet, with `$` markers and invalid-reference markers
//! - [`RangeAdapter`] - Keeps ranges valid across structural edits
//! - [`EvaluatedCell`] and [`Value`] - Typed results of an evaluation pass
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{Zone, UnboundedZone};
//!
//! let zone: Zone = "B5:A2".parse::<UnboundedZone>().unwrap().ordered().bounded().unwrap();
//! assert_eq!(zone.to_xc(), "A2:B5");
//! ```

pub mod cell;
pub mod error;
pub mod format;
pub mod range;
pub mod range_adapter;
pub mod sheet;
pub mod zone;

// Re-exports for convenience
pub use cell::{
    Align, CellValueType, ErrorKind, EvaluatedCell, EvaluationError, Severity, SharedString,
    Value, ValueAndFormat,
};
pub use error::{Error, Result};
pub use format::format_number;
pub use range::{adapt_ranges_for_copy, canonical_sheet_name, Range, RangePart, INVALID_REFERENCE};
pub use range_adapter::{
    ChangeType, Dimension, InsertPosition, RangeAdapter, RangeChange, RangeProvider,
    StructuralChange,
};
pub use sheet::{SheetId, SheetLookup, SheetSize};
pub use zone::{column_to_letters, letters_to_column, HeaderIndex, Position, UnboundedZone, Zone};

/// Maximum number of rows a sheet can grow to
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns a sheet can grow to
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
