use std::fmt;

use workload_grid::{LabelledGrid, LocatedCell, MismatchError};

use crate::coordinate::{Coordinate, CoordinateGroup, CoordinateSet};

/// The first coordinate set of a group whose coordinates all resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSet {
    pub label: Option<String>,
    pub cells: Vec<(Coordinate, LocatedCell)>,
}

/// Why one coordinate set was abandoned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetMismatch {
    /// Set label, or `set #n` (1-based) for unlabelled sets.
    pub label: String,
    /// First failing coordinate; `None` when the set expanded to nothing.
    pub error: Option<MismatchError>,
}

impl fmt::Display for SetMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}: {error}", self.label),
            None => write!(f, "{}: no coordinates", self.label),
        }
    }
}

/// No coordinate set of a group resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMismatch {
    pub reasons: Vec<SetMismatch>,
}

impl fmt::Display for GroupMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reasons.is_empty() {
            return f.write_str("no coordinate set to resolve");
        }
        for (i, reason) in self.reasons.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GroupMismatch {}

/// Resolves coordinates against one reference grid.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateResolver<'a> {
    grid: &'a LabelledGrid,
}

impl<'a> CoordinateResolver<'a> {
    pub fn new(grid: &'a LabelledGrid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &'a LabelledGrid {
        self.grid
    }

    pub fn resolve(&self, coordinate: &Coordinate) -> Result<LocatedCell, MismatchError> {
        self.grid
            .locate_cell(coordinate.rows.as_slice(), coordinate.cols.as_slice())
    }

    /// Resolve every coordinate of `set`, stopping at the first mismatch.
    pub fn resolve_set(
        &self,
        set: &CoordinateSet,
    ) -> Result<Vec<(Coordinate, LocatedCell)>, Option<MismatchError>> {
        let mut cells = Vec::with_capacity(set.len());
        for coordinate in set.coordinates() {
            let cell = self.resolve(&coordinate).map_err(Some)?;
            cells.push((coordinate, cell));
        }
        if cells.is_empty() {
            return Err(None);
        }
        Ok(cells)
    }

    /// Try the sets of `group` in order and accept the first one that resolves
    /// completely.
    pub fn resolve_group(&self, group: &CoordinateGroup) -> Result<ResolvedSet, GroupMismatch> {
        let mut reasons = Vec::new();
        for (n, set) in group.sets().enumerate() {
            let label = set.label();
            match self.resolve_set(&set) {
                Ok(cells) => return Ok(ResolvedSet { label, cells }),
                Err(error) => {
                    let label = label.unwrap_or_else(|| format!("set #{}", n + 1));
                    log::trace!("coordinate set {label} abandoned");
                    reasons.push(SetMismatch { label, error });
                }
            }
        }
        Err(GroupMismatch { reasons })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use workload_grid::{Grid, OriginPoint};

    use super::*;
    use crate::coordinate::{DimSpec, DimValue};

    fn grid() -> LabelledGrid {
        let sheet = Grid::from_rows(
            "Test",
            [
                ["", "", "Display", "Display", "Audio"],
                ["", "", "Brightness", "Contrast", "Volume"],
                ["HDR10", "UI", "3", "2", "1"],
                ["HDR10", "Audio", "5", "", "4"],
                ["SDR", "UI", "6", "7", "8"],
            ],
        );
        LabelledGrid::new(&sheet, OriginPoint::new(2, 2)).unwrap()
    }

    #[test]
    fn multi_valued_set_resolves_every_value() {
        let grid = grid();
        let resolver = CoordinateResolver::new(&grid);
        let group = CoordinateGroup::new(
            vec![DimSpec::one("HDR10"), DimSpec::many(["UI", "Audio"])],
            vec![DimSpec::one("Display"), DimSpec::one("Brightness")],
        );
        let resolved = resolver.resolve_group(&group).unwrap();
        assert_eq!(resolved.label, None);
        let values: Vec<f64> = resolved.cells.iter().map(|(_, c)| c.value()).collect();
        assert_eq!(values, vec![3.0, 5.0]);
    }

    #[test]
    fn a_single_failure_abandons_the_whole_set() {
        let grid = grid();
        let resolver = CoordinateResolver::new(&grid);
        let group = CoordinateGroup::new(
            vec![
                DimSpec::Labelled(vec![
                    ("hdr".into(), DimValue::one("HDR10")),
                    ("sdr".into(), DimValue::one("SDR")),
                ]),
                DimSpec::many(["UI", "Audio"]),
            ],
            vec![DimSpec::one("Contrast")],
        );
        // HDR10/Audio/Contrast is blank; SDR has no Audio row.
        let err = resolver.resolve_group(&group).unwrap_err();
        assert_eq!(err.reasons.len(), 2);
        assert_eq!(err.reasons[0].label, "[hdr, ]");
        assert!(matches!(
            err.reasons[0].error,
            Some(MismatchError::NotNumeric { .. })
        ));
        assert!(matches!(
            err.reasons[1].error,
            Some(MismatchError::NoMatch { .. })
        ));
        assert!(err.to_string().starts_with("[hdr, ]: mismatching coordinate"));
    }

    #[test]
    fn later_alternative_is_accepted() {
        let grid = grid();
        let resolver = CoordinateResolver::new(&grid);
        let group = CoordinateGroup::new(
            vec![
                DimSpec::Alternatives(vec![DimValue::one("4K"), DimValue::one("SDR")]),
                DimSpec::one("UI"),
            ],
            vec![DimSpec::any(), DimSpec::one("Volume")],
        );
        let resolved = resolver.resolve_group(&group).unwrap();
        assert_eq!(resolved.cells.len(), 1);
        assert_eq!(resolved.cells[0].1.value(), 8.0);
        assert_eq!(resolved.cells[0].1.index(), (2, 2));
    }

    #[test]
    fn empty_groups_and_sets_fail() {
        let grid = grid();
        let resolver = CoordinateResolver::new(&grid);

        let none = CoordinateGroup::new(vec![DimSpec::Alternatives(vec![])], vec![]);
        let err = resolver.resolve_group(&none).unwrap_err();
        assert!(err.reasons.is_empty());
        assert_eq!(err.to_string(), "no coordinate set to resolve");

        let empty = CoordinateGroup::new(vec![DimSpec::many(Vec::<String>::new())], vec![]);
        let err = resolver.resolve_group(&empty).unwrap_err();
        assert_eq!(err.to_string(), "set #1: no coordinates");
    }
}
