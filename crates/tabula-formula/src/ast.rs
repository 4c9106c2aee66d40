//! Formula Abstract Syntax Tree types

use tabula_core::ErrorKind;

/// Formula expression AST
///
/// References are not stored inline: [`Expr::Reference`] holds an index into
/// the formula's dependency list, so adapting a reference after a structural
/// edit never requires touching the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    Text(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(ErrorKind),

    // === References ===
    /// Reference to `dependencies[index]`
    Reference(usize),
    /// Defined name or global binding
    Name(String),

    // === Operators ===
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<Expr>,
    },

    // === Array ===
    /// Array literal, stored row by row as written
    Array(Vec<Vec<Expr>>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Percent,
}
