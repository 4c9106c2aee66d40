//! Zones: rectangular spans of header indices within one sheet

use crate::error::{Error, Result};
use crate::sheet::SheetSize;
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Column or row index, 0-based
///
/// Signed so that a zone moved or shrunk by a structural edit can go negative
/// and be rejected as malformed rather than wrapping around.
pub type HeaderIndex = i32;

/// Position of a cell in a sheet (0-based column and row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Column index (A=0)
    pub col: u32,
    /// Row index (row "1" is 0)
    pub row: u32,
}

impl Position {
    /// Create a new position
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Parse an A1-style cell address, ignoring `$` markers
    pub fn parse(xc: &str) -> Result<Self> {
        let corner = Corner::parse(xc.trim())?;
        match (corner.col, corner.row) {
            (Some(col), Some(row)) => Ok(Self::new(col as u32, row as u32)),
            _ => Err(Error::InvalidAddress(xc.to_string())),
        }
    }

    /// Format as A1-style string
    pub fn to_xc(&self) -> String {
        format!("{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_xc())
    }
}

/// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
            .ok_or_else(|| Error::InvalidAddress(format!("column too large: {}", letters)))?;
    }

    let col = col - 1;
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }

    Ok(col)
}

/// A rectangular zone with inclusive bounds
///
/// A zone produced by a selection drag may be unordered (`right < left`);
/// call [`Zone::ordered`] before using it anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Zone {
    pub left: HeaderIndex,
    pub right: HeaderIndex,
    pub top: HeaderIndex,
    pub bottom: HeaderIndex,
}

impl Zone {
    /// Create a zone from its corners
    pub fn new(left: HeaderIndex, top: HeaderIndex, right: HeaderIndex, bottom: HeaderIndex) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Single-cell zone
    pub fn single(position: Position) -> Self {
        let col = position.col as HeaderIndex;
        let row = position.row as HeaderIndex;
        Self::new(col, row, col, row)
    }

    /// Zone of `cols` x `rows` cells anchored at `anchor` (top-left)
    pub fn from_block(anchor: Position, cols: u32, rows: u32) -> Self {
        let left = anchor.col as HeaderIndex;
        let top = anchor.row as HeaderIndex;
        Self::new(
            left,
            top,
            left + cols as HeaderIndex - 1,
            top + rows as HeaderIndex - 1,
        )
    }

    /// Check that the corners are in order
    pub fn is_ordered(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Check that the zone is ordered and has no negative index
    pub fn is_well_formed(&self) -> bool {
        self.is_ordered() && self.left >= 0 && self.top >= 0
    }

    /// Return the same zone with top-left and bottom-right corners in order
    pub fn ordered(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            right: self.left.max(self.right),
            top: self.top.min(self.bottom),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Number of columns spanned (0 if unordered)
    pub fn width(&self) -> u32 {
        (self.right - self.left + 1).max(0) as u32
    }

    /// Number of rows spanned (0 if unordered)
    pub fn height(&self) -> u32 {
        (self.bottom - self.top + 1).max(0) as u32
    }

    /// Check if the zone covers exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    /// Top-left position, if the zone is well formed
    pub fn top_left(&self) -> Option<Position> {
        self.is_well_formed()
            .then(|| Position::new(self.left as u32, self.top as u32))
    }

    /// Check if a cell is within this zone
    pub fn contains(&self, position: Position) -> bool {
        let col = position.col as HeaderIndex;
        let row = position.row as HeaderIndex;
        col >= self.left && col <= self.right && row >= self.top && row <= self.bottom
    }

    /// Check if this zone overlaps with another
    pub fn overlaps(&self, other: &Zone) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.top <= other.bottom
            && self.bottom >= other.top
    }

    /// Get the intersection of two zones, if any
    pub fn intersection(&self, other: &Zone) -> Option<Zone> {
        if !self.overlaps(other) {
            return None;
        }

        Some(Zone::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        ))
    }

    /// Iterate over all positions in the zone, row by row
    ///
    /// Yields nothing for a malformed zone.
    pub fn positions(&self) -> ZonePositions {
        ZonePositions {
            zone: *self,
            col: self.left,
            row: self.top,
            done: !self.is_well_formed(),
        }
    }

    /// Format as `A1:B2` (or `A1` for a single cell), without `$` markers
    pub fn to_xc(&self) -> String {
        let top_left = format!(
            "{}{}",
            column_to_letters(self.left.max(0) as u32),
            self.top + 1
        );
        if self.is_single_cell() {
            top_left
        } else {
            format!(
                "{}:{}{}",
                top_left,
                column_to_letters(self.right.max(0) as u32),
                self.bottom + 1
            )
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_xc())
    }
}

impl FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<UnboundedZone>()?
            .bounded()
            .ok_or_else(|| Error::InvalidRange(format!("'{}' is not a bounded zone", s)))
    }
}

/// Iterator over positions in a zone
pub struct ZonePositions {
    zone: Zone,
    col: HeaderIndex,
    row: HeaderIndex,
    done: bool,
}

impl Iterator for ZonePositions {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.row > self.zone.bottom {
            return None;
        }

        let position = Position::new(self.col as u32, self.row as u32);

        self.col += 1;
        if self.col > self.zone.right {
            self.col = self.zone.left;
            self.row += 1;
        }

        Some(position)
    }
}

/// A zone whose right and/or bottom bound may be open
///
/// `right: None` is a full-row reference (`3:5`), `bottom: None` a
/// full-column reference (`B:D`). The open bound is resolved against the
/// sheet's current size every time it is read, so such a reference follows
/// the sheet as it grows or shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnboundedZone {
    pub left: HeaderIndex,
    pub top: HeaderIndex,
    pub right: Option<HeaderIndex>,
    pub bottom: Option<HeaderIndex>,
    /// The open reference starts at an explicit cell (`A2:A`, `B3:5`)
    pub has_header: bool,
}

impl UnboundedZone {
    /// Wrap a bounded zone
    pub fn from_zone(zone: Zone) -> Self {
        Self {
            left: zone.left,
            top: zone.top,
            right: Some(zone.right),
            bottom: Some(zone.bottom),
            has_header: false,
        }
    }

    /// Check if this is a full-row reference
    pub fn is_full_row(&self) -> bool {
        self.right.is_none()
    }

    /// Check if this is a full-column reference
    pub fn is_full_col(&self) -> bool {
        self.bottom.is_none()
    }

    /// The zone, if both bounds are closed
    pub fn bounded(&self) -> Option<Zone> {
        Some(Zone::new(self.left, self.top, self.right?, self.bottom?))
    }

    /// Resolve the open bounds against the sheet size
    pub fn resolve(&self, size: SheetSize) -> Zone {
        Zone::new(
            self.left,
            self.top,
            self.right.unwrap_or(size.num_cols as HeaderIndex - 1),
            self.bottom.unwrap_or(size.num_rows as HeaderIndex - 1),
        )
    }

    /// Check that the closed bounds are in order
    pub fn is_ordered(&self) -> bool {
        self.right.map_or(true, |right| self.left <= right)
            && self.bottom.map_or(true, |bottom| self.top <= bottom)
    }

    /// Check that the zone is ordered and has no negative index
    pub fn is_well_formed(&self) -> bool {
        self.is_ordered() && self.left >= 0 && self.top >= 0
    }

    /// Return the same zone with its closed bounds in order
    pub fn ordered(&self) -> Self {
        let mut zone = *self;
        if let Some(right) = zone.right {
            if right < zone.left {
                zone.right = Some(zone.left);
                zone.left = right;
            }
        }
        if let Some(bottom) = zone.bottom {
            if bottom < zone.top {
                zone.bottom = Some(zone.top);
                zone.top = bottom;
            }
        }
        zone
    }

    /// Build a zone from the one or two corners of a textual reference
    pub(crate) fn from_corners(corners: &[Corner]) -> Result<Self> {
        let invalid = || Error::InvalidRange(format!("{:?}", corners));
        match corners {
            [single] => match (single.col, single.row) {
                (Some(col), Some(row)) => Ok(Self::from_zone(Zone::new(col, row, col, row))),
                _ => Err(invalid()),
            },
            [first, second] => match (first.col, first.row, second.col, second.row) {
                (Some(left), Some(top), Some(right), Some(bottom)) => {
                    Ok(Self::from_zone(Zone::new(left, top, right, bottom)))
                }
                (Some(left), None, Some(right), None) => Ok(Self {
                    left,
                    top: 0,
                    right: Some(right),
                    bottom: None,
                    has_header: false,
                }),
                (None, Some(top), None, Some(bottom)) => Ok(Self {
                    left: 0,
                    top,
                    right: None,
                    bottom: Some(bottom),
                    has_header: false,
                }),
                (Some(left), Some(top), Some(right), None)
                | (Some(left), None, Some(right), Some(top)) => Ok(Self {
                    left,
                    top,
                    right: Some(right),
                    bottom: None,
                    has_header: true,
                }),
                (Some(left), Some(top), None, Some(bottom))
                | (None, Some(top), Some(left), Some(bottom)) => Ok(Self {
                    left,
                    top,
                    right: None,
                    bottom: Some(bottom),
                    has_header: true,
                }),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl From<Zone> for UnboundedZone {
    fn from(zone: Zone) -> Self {
        Self::from_zone(zone)
    }
}

impl FromStr for UnboundedZone {
    type Err = Error;

    /// Parse `A1`, `A1:B2`, `B:D`, `3:5`, `A2:A` or `B3:5` (with optional `$`)
    fn from_str(s: &str) -> Result<Self> {
        let corners = Corner::parse_all(s)?;
        Self::from_corners(&corners)
    }
}

/// One side of a textual reference, e.g. `$B`, `3`, `A$1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Corner {
    pub col: Option<HeaderIndex>,
    pub row: Option<HeaderIndex>,
    pub col_fixed: bool,
    pub row_fixed: bool,
}

impl Corner {
    /// Parse the one or two `:`-separated corners of a reference
    pub(crate) fn parse_all(xc: &str) -> Result<Vec<Corner>> {
        let xc = xc.trim();
        let corners = xc
            .split(':')
            .map(Corner::parse)
            .collect::<Result<Vec<_>>>()?;
        if corners.is_empty() || corners.len() > 2 {
            return Err(Error::InvalidRange(xc.to_string()));
        }
        Ok(corners)
    }

    pub(crate) fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let mut pos = 0;

        let mut first_fixed = false;
        if bytes.get(pos) == Some(&b'$') {
            first_fixed = true;
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let col = if pos > col_start {
            Some(letters_to_column(&s[col_start..pos])? as HeaderIndex)
        } else {
            None
        };

        let mut row_fixed = col.is_none() && first_fixed;
        if col.is_some() && bytes.get(pos) == Some(&b'$') {
            row_fixed = true;
            pos += 1;
        }

        let row_str = &s[pos..];
        let row = if row_str.is_empty() {
            None
        } else {
            let row: u32 = row_str
                .parse()
                .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
            if row == 0 {
                return Err(Error::InvalidAddress(format!(
                    "row number must be >= 1 in '{}'",
                    s
                )));
            }
            if row > MAX_ROWS {
                return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
            }
            Some(row as HeaderIndex - 1)
        };

        if col.is_none() && row.is_none() {
            return Err(Error::InvalidAddress(format!("'{}' has no column or row", s)));
        }

        Ok(Self {
            col,
            row,
            col_fixed: col.is_some() && first_fixed,
            row_fixed: row.is_some() && row_fixed,
        })
    }
}
