//! Model configuration

use ahash::AHashMap;
use tabula_core::{SheetSize, Value};

/// Options used when building a [`crate::Model`]
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Size of sheets created without an explicit size (default: 26 x 100)
    pub default_sheet_size: SheetSize,
    /// Name of the sheet every new model starts with
    pub first_sheet_name: String,
    /// Values formulas can refer to by name, matched case-insensitively
    pub globals: AHashMap<String, Value>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_sheet_size: SheetSize::new(26, 100),
            first_sheet_name: "Sheet1".to_string(),
            globals: AHashMap::new(),
        }
    }
}

impl ModelConfig {
    /// Bind a global value
    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }
}
