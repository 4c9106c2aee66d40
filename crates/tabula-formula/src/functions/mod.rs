//! Built-in functions

pub mod array;
pub mod info;
pub mod logical;
pub mod math;
pub mod text;

use crate::context::EvaluationContext;
use crate::value::{Arg, ComputedValue};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use tabula_core::EvaluationError;

/// Function implementation signature
pub type FunctionImpl = fn(&[Arg], &EvaluationContext<'_>) -> Result<ComputedValue, EvaluationError>;

/// How the arguments of a function are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Single values; a multi-cell reference is an error
    Value,
    /// Ranges are passed whole as matrices
    Range,
    /// References are passed as their address text
    Meta,
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// How references passed as arguments are read
    pub arg_kind: ArgKind,
    /// Receives failed arguments as [`Arg::Error`] instead of failing with them
    pub error_aware: bool,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Human-readable expected argument count
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }

    /// Check an argument count
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

static FUNCTION_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The process-wide table of built-in functions
pub fn function_registry() -> &'static FunctionRegistry {
    &FUNCTION_REGISTRY
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_info_functions();
        registry.register_array_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_uppercase().as_str())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        for (name, implementation) in [
            ("SUM", math::fn_sum as FunctionImpl),
            ("AVERAGE", math::fn_average),
            ("MIN", math::fn_min),
            ("MAX", math::fn_max),
            ("COUNT", math::fn_count),
        ] {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: None,
                arg_kind: ArgKind::Range,
                error_aware: false,
                implementation,
            });
        }
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "IF",
            min_args: 2,
            max_args: Some(3),
            arg_kind: ArgKind::Value,
            // Only the chosen branch may fail the call
            error_aware: true,
            implementation: logical::fn_if,
        });

        self.register(FunctionDef {
            name: "IFERROR",
            min_args: 1,
            max_args: Some(2),
            arg_kind: ArgKind::Value,
            error_aware: true,
            implementation: logical::fn_iferror,
        });

        self.register(FunctionDef {
            name: "AND",
            min_args: 1,
            max_args: None,
            arg_kind: ArgKind::Range,
            error_aware: false,
            implementation: logical::fn_and,
        });

        self.register(FunctionDef {
            name: "OR",
            min_args: 1,
            max_args: None,
            arg_kind: ArgKind::Range,
            error_aware: false,
            implementation: logical::fn_or,
        });

        self.register(FunctionDef {
            name: "NOT",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Value,
            error_aware: false,
            implementation: logical::fn_not,
        });
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef {
            name: "CONCAT",
            min_args: 1,
            max_args: None,
            arg_kind: ArgKind::Range,
            error_aware: false,
            implementation: text::fn_concat,
        });

        self.register(FunctionDef {
            name: "LEN",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Value,
            error_aware: false,
            implementation: text::fn_len,
        });

        self.register(FunctionDef {
            name: "UPPER",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Value,
            error_aware: false,
            implementation: text::fn_upper,
        });
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef {
            name: "ISERROR",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Value,
            error_aware: true,
            implementation: info::fn_iserror,
        });

        self.register(FunctionDef {
            name: "ROW",
            min_args: 0,
            max_args: Some(1),
            arg_kind: ArgKind::Meta,
            error_aware: false,
            implementation: info::fn_row,
        });

        self.register(FunctionDef {
            name: "COLUMN",
            min_args: 0,
            max_args: Some(1),
            arg_kind: ArgKind::Meta,
            error_aware: false,
            implementation: info::fn_column,
        });
    }

    fn register_array_functions(&mut self) {
        self.register(FunctionDef {
            name: "SEQUENCE",
            min_args: 1,
            max_args: Some(4),
            arg_kind: ArgKind::Value,
            error_aware: false,
            implementation: array::fn_sequence,
        });

        self.register(FunctionDef {
            name: "TRANSPOSE",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Range,
            error_aware: false,
            implementation: array::fn_transpose,
        });

        self.register(FunctionDef {
            name: "MUNIT",
            min_args: 1,
            max_args: Some(1),
            arg_kind: ArgKind::Value,
            error_aware: false,
            implementation: array::fn_munit,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Format of the first cell that has one
pub(crate) fn first_format(args: &[Arg]) -> Option<String> {
    args.iter()
        .flat_map(|arg| arg.cells())
        .find_map(|cell| cell.ok().and_then(|c| c.format))
}
