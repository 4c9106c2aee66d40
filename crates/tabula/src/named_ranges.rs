//! Defined names
//!
//! A defined name binds an identifier to a range so formulas can write
//! `=SUM(Sales)` instead of `=SUM(Sheet1!$B$2:$B$20)`.
//!
//! ```text
//! model.dispatch(Command::DefineName { name: "Sales".into(), sheet_id, reference: "$B$2:$B$20".into() })?;
//! // then, in any cell
//! =SUM(Sales)
//! ```

use ahash::AHashMap;
use lazy_regex::regex_is_match;
use tabula_core::{ChangeType, Error, Range, RangeChange, RangeProvider, Result, SheetId, INVALID_REFERENCE};

/// A defined name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name as it was defined; lookup ignores case
    pub name: String,
    pub range: Range,
}

/// Collection of defined names with case-insensitive lookup
#[derive(Debug, Default, Clone)]
pub struct NamedRanges {
    /// Keyed by lowercase name
    ranges: AHashMap<String, NamedRange>,
}

impl NamedRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a name
    pub fn define(&mut self, name: &str, range: Range) -> Result<()> {
        validate_name(name)?;
        self.ranges.insert(
            name.to_lowercase(),
            NamedRange {
                name: name.to_string(),
                range,
            },
        );
        Ok(())
    }

    /// Remove a name, returning its definition
    pub fn undefine(&mut self, name: &str) -> Option<NamedRange> {
        self.ranges.remove(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&NamedRange> {
        self.ranges.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All names, sorted case-insensitively
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        let mut names: Vec<_> = self.ranges.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        names.into_iter().map(|(_, named)| named)
    }
}

impl RangeProvider for NamedRanges {
    /// A name whose cells are all deleted stays defined but points nowhere
    fn adapt_ranges(&mut self, apply: &dyn Fn(&Range) -> RangeChange, sheet_id: Option<&SheetId>) {
        for named in self.ranges.values_mut() {
            if sheet_id.is_some() && named.range.sheet_id() != sheet_id {
                continue;
            }
            let change = apply(&named.range);
            named.range = match change.change_type {
                ChangeType::None => continue,
                ChangeType::Remove if change.range.invalid_sheet_name().is_none() => {
                    change.range.with_invalid_xc(INVALID_REFERENCE)
                }
                _ => change.range,
            };
        }
    }
}

/// Check that a name can be defined
///
/// Names start with a letter or `_`, continue with letters, digits, `_` or
/// `.`, and must not read as a cell reference or a boolean.
fn validate_name(name: &str) -> Result<()> {
    if !regex_is_match!(r"^[\p{L}_][\p{L}0-9_.]*$", name) {
        return Err(Error::InvalidName(format!("'{}' is not a valid name", name)));
    }
    if regex_is_match!(r"^(?i)(\$?[a-z]{1,3}\$?[0-9]+|r[0-9]*c[0-9]*|true|false)$", name) {
        return Err(Error::InvalidName(format!(
            "'{}' would be read as a reference or a value",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::Zone;

    fn range(zone: Zone) -> Range {
        Range::new(SheetId::new("s1"), zone)
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut names = NamedRanges::new();
        names.define("Sales", range(Zone::new(1, 1, 1, 9))).unwrap();
        assert_eq!(names.get("SALES").map(|n| n.name.as_str()), Some("Sales"));
        assert!(names.undefine("sales").is_some());
        assert!(names.is_empty());
    }

    #[test]
    fn test_invalid_names() {
        let mut names = NamedRanges::new();
        for bad in ["A1", "xfd10", "TRUE", "1abc", "my name", "R1C1", ""] {
            assert!(
                matches!(names.define(bad, range(Zone::new(0, 0, 0, 0))), Err(Error::InvalidName(_))),
                "{} should be rejected",
                bad
            );
        }
        assert!(names.define("tax_rate", range(Zone::new(0, 0, 0, 0))).is_ok());
        assert!(names.define("ABCD1", range(Zone::new(0, 0, 0, 0))).is_ok());
    }

    #[test]
    fn test_removed_range_becomes_invalid() {
        let mut names = NamedRanges::new();
        names.define("x", range(Zone::new(0, 0, 0, 0))).unwrap();
        names.define("y", range(Zone::new(3, 0, 3, 0))).unwrap();

        let apply = |r: &Range| {
            if r.unbounded_zone().left == 0 {
                RangeChange {
                    change_type: ChangeType::Remove,
                    range: r.clone(),
                }
            } else {
                RangeChange {
                    change_type: ChangeType::Move,
                    range: r.with_zone(Zone::new(2, 0, 2, 0)),
                }
            }
        };
        names.adapt_ranges(&apply, None);

        assert_eq!(names.get("x").and_then(|n| n.range.invalid_xc()), Some(INVALID_REFERENCE));
        assert_eq!(names.get("y").map(|n| n.range.unbounded_zone().left), Some(2));
    }
}
