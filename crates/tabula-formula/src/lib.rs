//! # tabula-formula
//!
//! Formula compilation unit for the tabula recalculation engine.
//!
//! This crate provides:
//! - Formula compilation (text → AST plus the ordered list of referenced ranges)
//! - Re-rendering of a formula once its references have been adapted
//! - Execution of a compiled formula against a [`ReferenceResolver`]
//! - Built-in functions
//!
//! The crate never reads cells itself: every reference goes through the
//! resolver supplied by the caller, which is where cycle detection and
//! lazy evaluation live.
//!
//! ## Example
//!
//! ```rust
//! use tabula_formula::CompiledFormula;
//!
//! let formula = CompiledFormula::compile("=SUM(A1:A3, $B$2) + A1").unwrap();
//! assert_eq!(formula.dependencies(), &["A1:A3", "$B$2", "A1"]);
//! assert_eq!(
//!     formula.render(&["A2:A4".into(), "$B$2".into(), "A2".into()]),
//!     "=SUM(A2:A4, $B$2) + A2"
//! );
//! ```

pub mod ast;
pub mod compiler;
pub mod context;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod parser;
pub mod value;

#[cfg(test)]
mod testing;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use compiler::CompiledFormula;
pub use context::{ArgPosition, EvaluationContext, GridReader, ReferenceResolver};
pub use error::{FormulaError, FormulaResult};
pub use functions::{function_registry, ArgKind, FunctionDef, FunctionRegistry};
pub use value::{Arg, CellResult, ComputedValue, RangeValues};
