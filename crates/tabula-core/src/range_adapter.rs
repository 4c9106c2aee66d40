//! Propagation of structural edits to every range held in the model
//!
//! Components that store ranges implement [`RangeProvider`]. When a
//! structural command runs, the model builds one [`RangeAdapter`] for it and
//! hands it to each provider in turn; the provider walks its own ranges,
//! calls [`RangeAdapter::apply`] on each one and stores the result.

use crate::range::Range;
use crate::sheet::{SheetId, SheetLookup, SheetSize};
use crate::zone::{HeaderIndex, UnboundedZone, Zone};
use tracing::trace;

/// What happened to a range after a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Untouched
    None,
    /// Everything the range pointed at is gone
    Remove,
    /// The range grew or shrank
    Resize,
    /// The range kept its size but moved
    Move,
    /// Same cells, different display string (sheet rename)
    Change,
}

/// Result of adapting one range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeChange {
    pub change_type: ChangeType,
    pub range: Range,
}

impl RangeChange {
    fn none(range: &Range) -> Self {
        Self {
            change_type: ChangeType::None,
            range: range.clone(),
        }
    }
}

/// Axis of a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Col,
    Row,
}

/// Side of the base header where new headers are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertPosition {
    Before,
    After,
}

/// A command that changes the shape of a sheet or the set of sheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralChange {
    AddColumnsRows {
        sheet_id: SheetId,
        dimension: Dimension,
        base: HeaderIndex,
        quantity: HeaderIndex,
        position: InsertPosition,
    },
    RemoveColumnsRows {
        sheet_id: SheetId,
        dimension: Dimension,
        elements: Vec<HeaderIndex>,
    },
    DeleteSheet {
        sheet_id: SheetId,
        sheet_name: String,
    },
    RenameSheet {
        sheet_id: SheetId,
        new_name: String,
    },
}

/// A component that owns ranges
pub trait RangeProvider {
    /// Run `apply` on every owned range and store what it returns
    ///
    /// `sheet_id`, when set, is the only sheet whose ranges can change;
    /// providers may use it to skip the rest.
    fn adapt_ranges(&mut self, apply: &dyn Fn(&Range) -> RangeChange, sheet_id: Option<&SheetId>);
}

impl RangeProvider for Vec<Range> {
    fn adapt_ranges(&mut self, apply: &dyn Fn(&Range) -> RangeChange, _sheet_id: Option<&SheetId>) {
        for range in self.iter_mut() {
            let change = apply(range);
            if change.change_type != ChangeType::None {
                *range = change.range;
            }
        }
    }
}

/// Range transformation for one structural change
#[derive(Debug, Clone)]
pub struct RangeAdapter {
    change: StructuralChange,
    /// Size of the edited sheet before the edit
    size: Option<SheetSize>,
    /// Consecutive runs of removed headers, highest first
    runs: Vec<(HeaderIndex, HeaderIndex)>,
}

impl RangeAdapter {
    /// Prepare the transformation
    ///
    /// Must be built before the sheet itself is resized, since removal and
    /// insertion compare against the pre-edit extent of open-ended ranges.
    pub fn new(change: StructuralChange, sheets: &dyn SheetLookup) -> Self {
        let size = match &change {
            StructuralChange::AddColumnsRows { sheet_id, .. }
            | StructuralChange::RemoveColumnsRows { sheet_id, .. } => sheets.sheet_size(sheet_id),
            _ => None,
        };
        let runs = match &change {
            StructuralChange::RemoveColumnsRows { elements, .. } => group_consecutive(elements),
            _ => Vec::new(),
        };
        Self { change, size, runs }
    }

    pub fn change(&self) -> &StructuralChange {
        &self.change
    }

    /// The only sheet whose ranges this change can touch, if any
    pub fn sheet_filter(&self) -> Option<&SheetId> {
        match &self.change {
            StructuralChange::AddColumnsRows { sheet_id, .. }
            | StructuralChange::RemoveColumnsRows { sheet_id, .. }
            | StructuralChange::DeleteSheet { sheet_id, .. } => Some(sheet_id),
            StructuralChange::RenameSheet { .. } => None,
        }
    }

    /// Hand the transformation to every provider
    pub fn notify(&self, providers: &mut [&mut dyn RangeProvider]) {
        let apply = |range: &Range| self.apply(range);
        for provider in providers.iter_mut() {
            provider.adapt_ranges(&apply, self.sheet_filter());
        }
    }

    /// Adapt one range
    ///
    /// Any reported change that leaves the zone inverted or negative is
    /// turned into [`ChangeType::Remove`].
    pub fn apply(&self, range: &Range) -> RangeChange {
        let mut result = self.adapt(range);
        if result.change_type != ChangeType::None
            && !result.range.unbounded_zone().is_well_formed()
        {
            result.change_type = ChangeType::Remove;
        }
        if result.change_type != ChangeType::None {
            trace!(
                change = ?result.change_type,
                zone = ?result.range.unbounded_zone(),
                "adapted range"
            );
        }
        result
    }

    fn adapt(&self, range: &Range) -> RangeChange {
        // A range to a missing sheet only waits for a rename to bring it back
        if range.invalid_sheet_name().is_some()
            && !matches!(self.change, StructuralChange::RenameSheet { .. })
        {
            return RangeChange::none(range);
        }
        match &self.change {
            StructuralChange::AddColumnsRows {
                sheet_id,
                dimension,
                base,
                quantity,
                position,
            } => {
                if range.sheet_id() != Some(sheet_id) {
                    return RangeChange::none(range);
                }
                let (start, end) = self.span(range, *dimension);
                let change_type = match position {
                    InsertPosition::After if start <= *base && *base < end => ChangeType::Resize,
                    InsertPosition::After if *base < start => ChangeType::Move,
                    InsertPosition::Before if start < *base && *base <= end => ChangeType::Resize,
                    InsertPosition::Before if *base <= start => ChangeType::Move,
                    _ => return RangeChange::none(range),
                };
                let zone = shift(range.unbounded_zone(), *dimension, change_type, *quantity);
                RangeChange {
                    change_type,
                    range: range.with_zone(zone),
                }
            }
            StructuralChange::RemoveColumnsRows {
                sheet_id,
                dimension,
                ..
            } => {
                if range.sheet_id() != Some(sheet_id) {
                    return RangeChange::none(range);
                }
                self.remove_headers(range, *dimension)
            }
            StructuralChange::DeleteSheet {
                sheet_id,
                sheet_name,
            } => {
                if range.sheet_id() != Some(sheet_id) {
                    return RangeChange::none(range);
                }
                RangeChange {
                    change_type: ChangeType::Remove,
                    range: range.with_invalid_sheet_name(sheet_name),
                }
            }
            StructuralChange::RenameSheet { sheet_id, new_name } => {
                if range.sheet_id() == Some(sheet_id) {
                    return RangeChange {
                        change_type: ChangeType::Change,
                        range: range.clone(),
                    };
                }
                match range.invalid_sheet_name() {
                    Some(name) if name.to_lowercase() == new_name.to_lowercase() => RangeChange {
                        change_type: ChangeType::Change,
                        range: range.with_sheet_id(sheet_id.clone()),
                    },
                    _ => RangeChange::none(range),
                }
            }
        }
    }

    fn remove_headers(&self, range: &Range, dimension: Dimension) -> RangeChange {
        let mut current = range.clone();
        let mut change_type = ChangeType::None;

        for &(min, max) in &self.runs {
            let (start, end) = self.span(&current, dimension);
            if start >= min && end <= max {
                return RangeChange {
                    change_type: ChangeType::Remove,
                    range: current,
                };
            }

            let zone = *current.unbounded_zone();
            let (zone, run_change) = if start <= min && min <= end {
                let removed = end.min(max) - min + 1;
                (shift(&zone, dimension, ChangeType::Resize, -removed), ChangeType::Resize)
            } else if start <= max && max <= end {
                let removed = max - start + 1;
                let zone = shift(&zone, dimension, ChangeType::Resize, -removed);
                (shift(&zone, dimension, ChangeType::Move, -(start - min)), ChangeType::Resize)
            } else if max < start {
                (shift(&zone, dimension, ChangeType::Move, -(max - min + 1)), ChangeType::Move)
            } else {
                continue;
            };

            current = current.with_zone(zone);
            if change_type != ChangeType::Resize {
                change_type = run_change;
            }
        }

        RangeChange {
            change_type,
            range: current,
        }
    }

    /// Start and end of the range along `dimension`, open ends resolved
    fn span(&self, range: &Range, dimension: Dimension) -> (HeaderIndex, HeaderIndex) {
        let zone = resolve(range.unbounded_zone(), self.size);
        match dimension {
            Dimension::Col => (zone.left, zone.right),
            Dimension::Row => (zone.top, zone.bottom),
        }
    }
}

fn resolve(zone: &UnboundedZone, size: Option<SheetSize>) -> Zone {
    match size {
        Some(size) => zone.resolve(size),
        None => Zone::new(
            zone.left,
            zone.top,
            zone.right.unwrap_or(zone.left),
            zone.bottom.unwrap_or(zone.top),
        ),
    }
}

/// Move or resize a zone along one axis; open ends stay open
fn shift(zone: &UnboundedZone, dimension: Dimension, change: ChangeType, by: HeaderIndex) -> UnboundedZone {
    let mut zone = *zone;
    match (dimension, change) {
        (Dimension::Col, ChangeType::Move) => {
            zone.left += by;
            zone.right = zone.right.map(|r| r + by);
        }
        (Dimension::Col, ChangeType::Resize) => zone.right = zone.right.map(|r| r + by),
        (Dimension::Row, ChangeType::Move) => {
            zone.top += by;
            zone.bottom = zone.bottom.map(|b| b + by);
        }
        (Dimension::Row, ChangeType::Resize) => zone.bottom = zone.bottom.map(|b| b + by),
        _ => {}
    }
    zone
}

/// Group header indices into consecutive `(min, max)` runs, highest run first
fn group_consecutive(elements: &[HeaderIndex]) -> Vec<(HeaderIndex, HeaderIndex)> {
    let mut sorted = elements.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut runs: Vec<(HeaderIndex, HeaderIndex)> = Vec::new();
    for index in sorted {
        match runs.last_mut() {
            Some((min, _)) if *min == index + 1 => *min = index,
            _ => runs.push((index, index)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct OneSheet;

    impl SheetLookup for OneSheet {
        fn sheet_size(&self, sheet_id: &SheetId) -> Option<SheetSize> {
            (sheet_id.as_str() == "s1").then_some(SheetSize::new(26, 100))
        }

        fn sheet_name(&self, sheet_id: &SheetId) -> Option<&str> {
            (sheet_id.as_str() == "s1").then_some("Sheet1")
        }

        fn sheet_id_by_name(&self, name: &str) -> Option<SheetId> {
            name.eq_ignore_ascii_case("Sheet1").then(|| SheetId::new("s1"))
        }
    }

    fn s1() -> SheetId {
        SheetId::new("s1")
    }

    fn range(xc: &str) -> Range {
        Range::from_sheet_xc(&s1(), xc, &OneSheet)
    }

    fn remove_cols(elements: Vec<HeaderIndex>) -> RangeAdapter {
        RangeAdapter::new(
            StructuralChange::RemoveColumnsRows {
                sheet_id: s1(),
                dimension: Dimension::Col,
                elements,
            },
            &OneSheet,
        )
    }

    fn add(dimension: Dimension, base: HeaderIndex, quantity: HeaderIndex, position: InsertPosition) -> RangeAdapter {
        RangeAdapter::new(
            StructuralChange::AddColumnsRows {
                sheet_id: s1(),
                dimension,
                base,
                quantity,
                position,
            },
            &OneSheet,
        )
    }

    fn adapted(adapter: &RangeAdapter, xc: &str) -> (ChangeType, String) {
        let change = adapter.apply(&range(xc));
        (change.change_type, change.range.to_display_string(&s1(), &OneSheet))
    }

    #[test]
    fn test_group_consecutive() {
        assert_eq!(group_consecutive(&[1, 2, 3, 7, 5, 6, 10]), vec![(10, 10), (5, 7), (1, 3)]);
        assert_eq!(group_consecutive(&[4, 4]), vec![(4, 4)]);
    }

    #[test]
    fn test_remove_column_inside_range() {
        let adapter = remove_cols(vec![2]);
        assert_eq!(adapted(&adapter, "C1").0, ChangeType::Remove);
        assert_eq!(adapted(&adapter, "A1:E1"), (ChangeType::Resize, "A1:D1".into()));
        assert_eq!(adapted(&adapter, "F1"), (ChangeType::Move, "E1".into()));
        assert_eq!(adapted(&adapter, "B1").0, ChangeType::None);
    }

    #[test]
    fn test_remove_run_overlapping_start() {
        // Removing B:D from C1:F1 leaves the E:F part, now at B:C
        let adapter = remove_cols(vec![1, 2, 3]);
        assert_eq!(adapted(&adapter, "C1:F1"), (ChangeType::Resize, "B1:C1".into()));
    }

    #[test]
    fn test_remove_several_runs() {
        let adapter = remove_cols(vec![0, 4, 5]);
        assert_eq!(adapted(&adapter, "B1:G1"), (ChangeType::Resize, "A1:D1".into()));
        assert_eq!(adapted(&adapter, "H1"), (ChangeType::Move, "E1".into()));
    }

    #[test]
    fn test_remove_full_column_keeps_open_end() {
        let adapter = RangeAdapter::new(
            StructuralChange::RemoveColumnsRows {
                sheet_id: s1(),
                dimension: Dimension::Row,
                elements: vec![0],
            },
            &OneSheet,
        );
        let change = adapter.apply(&range("B:B"));
        assert_eq!(change.change_type, ChangeType::Resize);
        assert_eq!(change.range.unbounded_zone().bottom, None);
    }

    #[test]
    fn test_add_after() {
        let adapter = add(Dimension::Row, 1, 2, InsertPosition::After);
        assert_eq!(adapted(&adapter, "A1:A3"), (ChangeType::Resize, "A1:A5".into()));
        assert_eq!(adapted(&adapter, "A3"), (ChangeType::Move, "A5".into()));
        assert_eq!(adapted(&adapter, "A2"), (ChangeType::None, "A2".into()));
    }

    #[test]
    fn test_add_before() {
        let adapter = add(Dimension::Col, 1, 1, InsertPosition::Before);
        assert_eq!(adapted(&adapter, "A1:B1"), (ChangeType::Resize, "A1:C1".into()));
        assert_eq!(adapted(&adapter, "B1"), (ChangeType::Move, "C1".into()));
        assert_eq!(adapted(&adapter, "A1"), (ChangeType::None, "A1".into()));
    }

    #[test]
    fn test_other_sheet_untouched() {
        let adapter = remove_cols(vec![0]);
        let other = Range::new(SheetId::new("s2"), Zone::new(0, 0, 0, 0));
        assert_eq!(adapter.apply(&other).change_type, ChangeType::None);
    }

    #[test]
    fn test_delete_then_rename_repairs() {
        let delete = RangeAdapter::new(
            StructuralChange::DeleteSheet {
                sheet_id: s1(),
                sheet_name: "Sheet1".into(),
            },
            &OneSheet,
        );
        let removed = delete.apply(&range("A1"));
        assert_eq!(removed.change_type, ChangeType::Remove);
        assert_eq!(removed.range.sheet_id(), None);
        assert_eq!(removed.range.invalid_sheet_name(), Some("Sheet1"));

        let s3 = SheetId::new("s3");
        let rename = RangeAdapter::new(
            StructuralChange::RenameSheet {
                sheet_id: s3.clone(),
                new_name: "sheet1".into(),
            },
            &OneSheet,
        );
        let repaired = rename.apply(&removed.range);
        assert_eq!(repaired.change_type, ChangeType::Change);
        assert_eq!(repaired.range.sheet_id(), Some(&s3));
        assert_eq!(repaired.range.invalid_sheet_name(), None);
    }

    #[test]
    fn test_unknown_sheet_range_is_not_shifted() {
        let unknown = range("Nowhere!C1");
        let change = remove_cols(vec![0]).apply(&unknown);
        assert_eq!(change.change_type, ChangeType::None);
        assert_eq!(change.range, unknown);

        let change = add(Dimension::Col, 0, 2, InsertPosition::Before).apply(&unknown);
        assert_eq!(change.change_type, ChangeType::None);

        let delete = RangeAdapter::new(
            StructuralChange::DeleteSheet {
                sheet_id: s1(),
                sheet_name: "Sheet1".into(),
            },
            &OneSheet,
        );
        let change = delete.apply(&unknown);
        assert_eq!(change.change_type, ChangeType::None);
        assert_eq!(change.range.invalid_sheet_name(), Some("Nowhere"));

        let rename = RangeAdapter::new(
            StructuralChange::RenameSheet {
                sheet_id: SheetId::new("s2"),
                new_name: "nowhere".into(),
            },
            &OneSheet,
        );
        let repaired = rename.apply(&unknown);
        assert_eq!(repaired.change_type, ChangeType::Change);
        assert_eq!(repaired.range.unbounded_zone(), unknown.unbounded_zone());
        assert_eq!(repaired.range.sheet_id(), Some(&SheetId::new("s2")));
    }

    #[test]
    fn test_rename_reports_change() {
        let rename = RangeAdapter::new(
            StructuralChange::RenameSheet {
                sheet_id: s1(),
                new_name: "Data".into(),
            },
            &OneSheet,
        );
        let change = rename.apply(&range("B2"));
        assert_eq!(change.change_type, ChangeType::Change);
        assert_eq!(change.range, range("B2"));
        assert_eq!(rename.sheet_filter(), None);
    }

    #[test]
    fn test_notify_providers() {
        let adapter = remove_cols(vec![2]);
        let mut first = vec![range("D1"), range("A1")];
        let mut second = vec![range("C1:E1")];
        adapter.notify(&mut [&mut first, &mut second]);

        let shown: Vec<_> = first
            .iter()
            .chain(second.iter())
            .map(|r| r.to_display_string(&s1(), &OneSheet))
            .collect();
        assert_eq!(shown, vec!["C1", "A1", "C1:D1"]);
    }
}
