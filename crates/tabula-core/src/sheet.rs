//! Sheet identity and the read-only sheet directory consumed by ranges

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a sheet
///
/// Unlike the sheet name, the id never changes for the lifetime of the sheet,
/// so ranges store the id and look the name up at display time.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(Arc<str>);

impl SheetId {
    /// Create a new sheet id
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        SheetId(Arc::from(id.as_ref()))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for SheetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SheetId {
    fn from(s: &str) -> Self {
        SheetId::new(s)
    }
}

impl From<String> for SheetId {
    fn from(s: String) -> Self {
        SheetId::new(s)
    }
}

/// Current dimensions of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetSize {
    /// Number of columns
    pub num_cols: u32,
    /// Number of rows
    pub num_rows: u32,
}

impl SheetSize {
    /// Create a new sheet size
    pub fn new(num_cols: u32, num_rows: u32) -> Self {
        Self { num_cols, num_rows }
    }
}

/// Read-only view of the sheets a range can point at
///
/// This is the sheet-size oracle used to resolve unbounded zones, plus the
/// name directory used to parse and display sheet-prefixed references.
pub trait SheetLookup {
    /// Current size of a sheet, `None` if the sheet does not exist
    fn sheet_size(&self, sheet_id: &SheetId) -> Option<SheetSize>;

    /// Current name of a sheet
    fn sheet_name(&self, sheet_id: &SheetId) -> Option<&str>;

    /// Find a sheet by name (case-insensitive)
    fn sheet_id_by_name(&self, name: &str) -> Option<SheetId>;
}
