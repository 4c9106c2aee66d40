//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    // Commands
    Command,
    Dimension,
    InsertPosition,
    // Error types
    Error,
    ErrorKind,
    EvaluatedCell,
    EvaluationError,
    // Main types
    Model,
    ModelConfig,
    Position,
    Range,
    Result,
    SheetId,
    SheetSize,
    // Cell types
    Value,
};
