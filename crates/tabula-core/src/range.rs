//! Sheet-bound ranges

use crate::sheet::{SheetId, SheetLookup};
use crate::zone::{column_to_letters, Corner, HeaderIndex, UnboundedZone, Zone};
use lazy_regex::{regex_captures, regex_is_match};

/// Display string of a range whose zone is no longer valid
pub const INVALID_REFERENCE: &str = "#REF";

/// `$` markers of one corner of a reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RangePart {
    pub col_fixed: bool,
    pub row_fixed: bool,
}

impl RangePart {
    pub fn new(col_fixed: bool, row_fixed: bool) -> Self {
        Self {
            col_fixed,
            row_fixed,
        }
    }

    fn is_fixed(&self) -> bool {
        self.col_fixed || self.row_fixed
    }
}

/// A zone bound to a sheet
///
/// Ranges are values: every transformation returns a new `Range` and leaves
/// the original untouched. A range that stops pointing at anything is never
/// dropped silently; it carries `invalid_xc` (unparsable text) or
/// `invalid_sheet_name` (unknown or deleted sheet) so it can still be
/// displayed and, for a sheet name, repaired by a later rename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    zone: UnboundedZone,
    /// One entry per corner written in the source text (1 or 2)
    parts: Vec<RangePart>,
    sheet_id: Option<SheetId>,
    prefix_sheet: bool,
    invalid_xc: Option<String>,
    invalid_sheet_name: Option<String>,
}

impl Range {
    /// Create a range over `zone` in `sheet_id`, with no `$` markers
    pub fn new(sheet_id: SheetId, zone: impl Into<UnboundedZone>) -> Self {
        let zone = zone.into();
        let corners = if zone.bounded().map_or(false, |z| z.is_single_cell()) {
            1
        } else {
            2
        };
        Self {
            zone,
            parts: vec![RangePart::default(); corners],
            sheet_id: Some(sheet_id),
            prefix_sheet: false,
            invalid_xc: None,
            invalid_sheet_name: None,
        }
    }

    /// Parse a reference such as `A1`, `$B$2:C3`, `B:D`, `3:5` or `'My Sheet'!A1`
    ///
    /// Never fails: text that is not a reference gives a range carrying
    /// `invalid_xc`, and an unknown sheet name gives a range on
    /// `default_sheet` carrying `invalid_sheet_name`.
    pub fn from_sheet_xc(default_sheet: &SheetId, xc: &str, sheets: &dyn SheetLookup) -> Self {
        let xc = xc.trim();
        let (sheet_name, reference) = split_sheet_prefix(xc);

        let corners = match Corner::parse_all(reference) {
            Ok(corners) => corners,
            Err(_) => return Self::invalid(default_sheet.clone(), xc),
        };
        let zone = match UnboundedZone::from_corners(&corners) {
            Ok(zone) => zone,
            Err(_) => return Self::invalid(default_sheet.clone(), xc),
        };

        let parts = corners
            .iter()
            .map(|c| RangePart::new(c.col_fixed, c.row_fixed))
            .collect();

        let mut range = Self {
            zone,
            parts,
            sheet_id: Some(default_sheet.clone()),
            prefix_sheet: sheet_name.is_some(),
            invalid_xc: None,
            invalid_sheet_name: None,
        };

        if let Some(name) = sheet_name {
            match sheets.sheet_id_by_name(&name) {
                Some(id) => range.sheet_id = Some(id),
                None => range.invalid_sheet_name = Some(name),
            }
        }

        range.order_zone().collapse_single_cell()
    }

    /// `A1:A1` written without `$` is the same range as `A1`
    fn collapse_single_cell(mut self) -> Self {
        let single_cell = self.zone.bounded().map_or(false, |z| z.is_single_cell());
        if single_cell && !self.parts.iter().any(RangePart::is_fixed) {
            self.parts.truncate(1);
        }
        self
    }

    fn invalid(sheet_id: SheetId, xc: &str) -> Self {
        Self {
            zone: UnboundedZone::from_zone(Zone::new(0, 0, 0, 0)),
            parts: vec![RangePart::default()],
            sheet_id: Some(sheet_id),
            prefix_sheet: false,
            invalid_xc: Some(xc.to_string()),
            invalid_sheet_name: None,
        }
    }

    /// The unresolved zone
    pub fn unbounded_zone(&self) -> &UnboundedZone {
        &self.zone
    }

    pub fn parts(&self) -> &[RangePart] {
        &self.parts
    }

    pub fn sheet_id(&self) -> Option<&SheetId> {
        self.sheet_id.as_ref()
    }

    pub fn prefix_sheet(&self) -> bool {
        self.prefix_sheet
    }

    pub fn invalid_xc(&self) -> Option<&str> {
        self.invalid_xc.as_deref()
    }

    pub fn invalid_sheet_name(&self) -> Option<&str> {
        self.invalid_sheet_name.as_deref()
    }

    /// Check if this range points at a sheet and a well-formed zone
    pub fn is_valid(&self) -> bool {
        self.invalid_xc.is_none()
            && self.invalid_sheet_name.is_none()
            && self.sheet_id.is_some()
            && self.zone.is_well_formed()
    }

    pub fn is_full_row(&self) -> bool {
        self.zone.is_full_row()
    }

    pub fn is_full_col(&self) -> bool {
        self.zone.is_full_col()
    }

    /// Resolve the zone against the current size of the target sheet
    ///
    /// If the sheet is unknown, open bounds collapse onto their start.
    pub fn zone(&self, sheets: &dyn SheetLookup) -> Zone {
        match self.sheet_id.as_ref().and_then(|id| sheets.sheet_size(id)) {
            Some(size) => self.zone.resolve(size),
            None => Zone::new(
                self.zone.left,
                self.zone.top,
                self.zone.right.unwrap_or(self.zone.left),
                self.zone.bottom.unwrap_or(self.zone.top),
            ),
        }
    }

    /// Copy of this range with another zone
    pub fn with_zone(&self, zone: impl Into<UnboundedZone>) -> Self {
        Self {
            zone: zone.into(),
            ..self.clone()
        }
    }

    /// Copy of this range pointing at another sheet, clearing any invalid sheet name
    pub fn with_sheet_id(&self, sheet_id: SheetId) -> Self {
        Self {
            sheet_id: Some(sheet_id),
            invalid_sheet_name: None,
            ..self.clone()
        }
    }

    /// Copy of this range detached from its sheet, remembering the sheet name
    pub fn with_invalid_sheet_name(&self, name: &str) -> Self {
        Self {
            sheet_id: None,
            invalid_sheet_name: Some(name.to_string()),
            ..self.clone()
        }
    }

    /// Copy of this range with other `$` markers
    pub fn with_parts(&self, parts: Vec<RangePart>) -> Self {
        if parts.is_empty() {
            return self.clone();
        }
        Self {
            parts,
            ..self.clone()
        }
    }

    /// Copy of this range that no longer points anywhere and displays as `xc`
    pub fn with_invalid_xc(&self, xc: &str) -> Self {
        Self {
            invalid_xc: Some(xc.to_string()),
            ..self.clone()
        }
    }

    fn part(&self, index: usize) -> RangePart {
        self.parts
            .get(index)
            .or_else(|| self.parts.first())
            .copied()
            .unwrap_or_default()
    }

    /// Normalize inverted corners, moving the `$` markers with their corner
    pub fn order_zone(&self) -> Self {
        let mut range = self.clone();
        let swap_cols = matches!(self.zone.right, Some(right) if right < self.zone.left);
        let swap_rows = matches!(self.zone.bottom, Some(bottom) if bottom < self.zone.top);
        if !swap_cols && !swap_rows {
            return range;
        }

        range.zone = self.zone.ordered();
        if range.parts.len() == 2 {
            let (first, second) = (self.parts[0], self.parts[1]);
            if swap_cols {
                range.parts[0].col_fixed = second.col_fixed;
                range.parts[1].col_fixed = first.col_fixed;
            }
            if swap_rows {
                range.parts[0].row_fixed = second.row_fixed;
                range.parts[1].row_fixed = first.row_fixed;
            }
        }
        range
    }

    /// Render as `Sheet!A1:B2`, relative to the sheet the text is shown in
    ///
    /// The sheet prefix is written when the range was parsed with one, when
    /// it targets another sheet, or when its sheet name is invalid.
    pub fn to_display_string(&self, for_sheet: &SheetId, sheets: &dyn SheetLookup) -> String {
        if let Some(xc) = &self.invalid_xc {
            return xc.clone();
        }
        if !self.zone.is_well_formed() {
            return INVALID_REFERENCE.to_string();
        }

        let prefix = match (&self.invalid_sheet_name, &self.sheet_id) {
            (Some(name), _) => Some(name.clone()),
            (None, Some(id)) if self.prefix_sheet || id != for_sheet => {
                sheets.sheet_name(id).map(str::to_string)
            }
            (None, Some(_)) => None,
            (None, None) => return INVALID_REFERENCE.to_string(),
        };
        let prefix = prefix
            .map(|name| format!("{}!", canonical_sheet_name(&name)))
            .unwrap_or_default();

        let single_cell = self.zone.bounded().map_or(false, |z| z.is_single_cell());
        let any_fixed = self.parts.iter().any(RangePart::is_fixed);
        if single_cell && (self.parts.len() < 2 || !any_fixed) {
            format!("{}{}", prefix, self.part_string(0))
        } else {
            format!("{}{}:{}", prefix, self.part_string(0), self.part_string(1))
        }
    }

    fn part_string(&self, index: usize) -> String {
        let part = self.part(index);
        let zone = &self.zone;
        let (col, row) = if index == 0 {
            (
                (zone.right.is_some() || zone.has_header).then_some(zone.left),
                (zone.bottom.is_some() || zone.has_header).then_some(zone.top),
            )
        } else {
            (zone.right, zone.bottom)
        };

        let mut s = String::new();
        if let Some(col) = col {
            if part.col_fixed {
                s.push('$');
            }
            s.push_str(&column_to_letters(col.max(0) as u32));
        }
        if let Some(row) = row {
            if part.row_fixed {
                s.push('$');
            }
            s.push_str(&(row + 1).to_string());
        }
        s
    }

    /// Shift this range by a copy/paste offset, landing on `target`
    ///
    /// `$`-fixed coordinates stay put, a range written with an explicit sheet
    /// keeps that sheet, and full rows (columns) only move horizontally
    /// (vertically) when they start at an explicit cell.
    pub fn adapt_for_copy(&self, offset_x: HeaderIndex, offset_y: HeaderIndex, target: &SheetId) -> Self {
        if self.invalid_xc.is_some() || !self.zone.is_well_formed() {
            return self.clone();
        }

        let first = self.part(0);
        let last = self.part(1);
        let z = &self.zone;
        let shift_x = |fixed: bool| if fixed { 0 } else { offset_x };
        let shift_y = |fixed: bool| if fixed { 0 } else { offset_y };

        let zone = UnboundedZone {
            left: if z.is_full_row() && !z.has_header {
                z.left
            } else {
                z.left + shift_x(first.col_fixed)
            },
            right: z.right.map(|right| right + shift_x(last.col_fixed)),
            top: if z.is_full_col() && !z.has_header {
                z.top
            } else {
                z.top + shift_y(first.row_fixed)
            },
            bottom: z.bottom.map(|bottom| bottom + shift_y(last.row_fixed)),
            has_header: z.has_header,
        };

        let range = if self.prefix_sheet {
            self.with_zone(zone)
        } else {
            Self {
                zone,
                sheet_id: Some(target.clone()),
                ..self.clone()
            }
        };
        range.order_zone()
    }
}

/// Shift every range by a copy/paste offset (see [`Range::adapt_for_copy`])
pub fn adapt_ranges_for_copy(
    ranges: &[Range],
    offset_x: HeaderIndex,
    offset_y: HeaderIndex,
    target: &SheetId,
) -> Vec<Range> {
    ranges
        .iter()
        .map(|range| range.adapt_for_copy(offset_x, offset_y, target))
        .collect()
}

/// Sheet name as written in a reference, quoted when it needs to be
pub fn canonical_sheet_name(name: &str) -> String {
    if regex_is_match!(r"^[\p{L}0-9_.]+$", name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Split `Sheet!A1` or `'My sheet'!A1` into sheet name and reference
fn split_sheet_prefix(xc: &str) -> (Option<String>, &str) {
    if let Some((_, quoted, plain, reference)) =
        regex_captures!(r"^(?:'((?:[^']|'')+)'|([^'!]+))!(.+)$", xc)
    {
        let name = if quoted.is_empty() {
            plain.to_string()
        } else {
            quoted.replace("''", "'")
        };
        return (Some(name), reference);
    }
    (None, xc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::SheetSize;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    struct Sheets(Vec<(SheetId, &'static str)>);

    impl Sheets {
        fn new() -> Self {
            Sheets(vec![
                (SheetId::new("s1"), "Sheet1"),
                (SheetId::new("s2"), "My Sheet"),
            ])
        }
    }

    impl SheetLookup for Sheets {
        fn sheet_size(&self, sheet_id: &SheetId) -> Option<SheetSize> {
            self.0
                .iter()
                .any(|(id, _)| id == sheet_id)
                .then_some(SheetSize::new(26, 100))
        }

        fn sheet_name(&self, sheet_id: &SheetId) -> Option<&str> {
            self.0.iter().find(|(id, _)| id == sheet_id).map(|(_, n)| *n)
        }

        fn sheet_id_by_name(&self, name: &str) -> Option<SheetId> {
            self.0
                .iter()
                .find(|(_, n)| n.eq_ignore_ascii_case(name))
                .map(|(id, _)| id.clone())
        }
    }

    fn s1() -> SheetId {
        SheetId::new("s1")
    }

    fn parse(xc: &str) -> Range {
        Range::from_sheet_xc(&s1(), xc, &Sheets::new())
    }

    fn display(range: &Range) -> String {
        range.to_display_string(&s1(), &Sheets::new())
    }

    #[test]
    fn test_parse_simple() {
        let range = parse("A1:B2");
        assert!(range.is_valid());
        assert_eq!(range.zone(&Sheets::new()), Zone::new(0, 0, 1, 1));
        assert_eq!(range.sheet_id(), Some(&s1()));
        assert!(!range.prefix_sheet());
        assert_eq!(display(&range), "A1:B2");
    }

    #[test]
    fn test_inverted_corners_are_ordered() {
        let range = parse("B5:A2");
        assert_eq!(range.zone(&Sheets::new()), Zone::new(0, 1, 1, 4));
        assert_eq!(display(&range), "A2:B5");

        let range = parse("$B5:A$2");
        assert_eq!(
            range.parts(),
            &[RangePart::new(false, true), RangePart::new(true, false)]
        );
        assert_eq!(display(&range), "A$2:$B5");
    }

    #[test]
    fn test_order_zone_idempotent() {
        let range = parse("C$1:$A3");
        let once = range.order_zone();
        assert_eq!(once.order_zone(), once);
    }

    #[test]
    fn test_single_cell_collapse() {
        assert_eq!(display(&parse("A2:A2")), "A2");
        assert_eq!(display(&parse("A$2:A2")), "A$2:A2");
        assert_eq!(display(&parse("$A$2")), "$A$2");
    }

    #[test]
    fn test_full_rows_and_columns() {
        let sheets = Sheets::new();
        let range = parse("B:D");
        assert!(range.is_full_col());
        assert_eq!(range.zone(&sheets), Zone::new(1, 0, 3, 99));
        assert_eq!(display(&range), "B:D");

        assert_eq!(display(&parse("$3:5")), "$3:5");
        assert_eq!(display(&parse("A2:A")), "A2:A");
        assert_eq!(display(&parse("B3:5")), "B3:5");
    }

    #[test]
    fn test_sheet_prefix() {
        let range = parse("'My Sheet'!A1");
        assert_eq!(range.sheet_id(), Some(&SheetId::new("s2")));
        assert!(range.prefix_sheet());
        assert_eq!(display(&range), "'My Sheet'!A1");

        let range = parse("Sheet1!C3");
        assert_eq!(display(&range), "Sheet1!C3");

        let range = Range::new(SheetId::new("s2"), Zone::new(0, 0, 1, 0));
        assert_eq!(display(&range), "'My Sheet'!A1:B1");
    }

    #[test]
    fn test_repeated_single_cell() {
        let range = parse("A1:A1");
        assert_eq!(range, parse("A1"));
        assert_eq!(display(&range), "A1");

        let range = parse("$A1:A1");
        assert_eq!(range.parts().len(), 2);
        assert_eq!(display(&range), "$A1:A1");
        assert_eq!(parse(&display(&range)), range);
    }

    #[test]
    fn test_unknown_sheet_keeps_name() {
        let range = parse("Nowhere!A1");
        assert_eq!(range.invalid_sheet_name(), Some("Nowhere"));
        assert!(!range.is_valid());
        assert_eq!(display(&range), "Nowhere!A1");
    }

    #[test]
    fn test_invalid_xc() {
        let range = parse("hello world");
        assert_eq!(range.invalid_xc(), Some("hello world"));
        assert_eq!(display(&range), "hello world");
    }

    #[test]
    fn test_malformed_zone_displays_ref() {
        let range = parse("A1").with_zone(Zone::new(-1, 0, -1, 0));
        assert_eq!(display(&range), INVALID_REFERENCE);
    }

    #[test]
    fn test_canonical_sheet_name() {
        assert_eq!(canonical_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(canonical_sheet_name("My Sheet"), "'My Sheet'");
        assert_eq!(canonical_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_adapt_for_copy() {
        let target = SheetId::new("s2");
        let copied = parse("A1:$B$2").adapt_for_copy(2, 3, &target);
        assert_eq!(copied.sheet_id(), Some(&target));
        assert_eq!(
            copied.to_display_string(&target, &Sheets::new()),
            "$B$2:C4"
        );

        let prefixed = parse("Sheet1!A1").adapt_for_copy(1, 1, &target);
        assert_eq!(prefixed.sheet_id(), Some(&s1()));
        assert_eq!(display(&prefixed), "Sheet1!B2");
    }

    #[test]
    fn test_adapt_for_copy_full_rows_and_columns() {
        let s1 = s1();
        let ranges = adapt_ranges_for_copy(&[parse("B:C"), parse("2:3"), parse("A2:A")], 1, 1, &s1);
        let shown: Vec<_> = ranges.iter().map(display).collect();
        assert_eq!(shown, vec!["C:D", "3:4", "B3:B"]);
    }

    #[test]
    fn test_with_invalid_sheet_name_and_repair() {
        let range = parse("A1");
        let broken = range.with_invalid_sheet_name("Gone");
        assert_eq!(broken.sheet_id(), None);
        assert_eq!(display(&broken), "Gone!A1");

        let repaired = broken.with_sheet_id(s1());
        assert!(repaired.is_valid());
        assert_eq!(display(&repaired), "A1");
    }

    fn corner_text(col: u32, row: u32, col_fixed: bool, row_fixed: bool) -> String {
        format!(
            "{}{}{}{}",
            if col_fixed { "$" } else { "" },
            column_to_letters(col),
            if row_fixed { "$" } else { "" },
            row + 1
        )
    }

    proptest! {
        #[test]
        fn prop_display_round_trip(
            c1 in 0u32..60, r1 in 0u32..200, c2 in 0u32..60, r2 in 0u32..200,
            f in proptest::array::uniform4(any::<bool>()),
        ) {
            let text = format!(
                "{}:{}",
                corner_text(c1, r1, f[0], f[1]),
                corner_text(c2, r2, f[2], f[3])
            );
            let range = parse(&text);
            prop_assert_eq!(parse(&display(&range)), range);
        }

        #[test]
        fn prop_order_zone_idempotent(
            c1 in 0u32..60, r1 in 0u32..200, c2 in 0u32..60, r2 in 0u32..200,
            f in proptest::array::uniform4(any::<bool>()),
        ) {
            let range = parse(&format!(
                "{}:{}",
                corner_text(c1, r1, f[0], f[1]),
                corner_text(c2, r2, f[2], f[3])
            ));
            let ordered = range.order_zone();
            prop_assert!(ordered.unbounded_zone().is_ordered());
            prop_assert_eq!(ordered.order_zone(), ordered);
        }
    }
}
