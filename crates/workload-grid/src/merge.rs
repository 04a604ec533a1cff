use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellRef, Range};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("merged region {new} overlaps existing merged region {existing}")]
    Overlap { new: Range, existing: Range },
}

/// A merged rectangle; its value lives in the top-left (anchor) cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergedRegion {
    pub range: Range,
}

impl MergedRegion {
    pub const fn anchor(&self) -> CellRef {
        self.range.start
    }
}

/// Non-overlapping set of merged regions for one grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRegions {
    #[serde(default)]
    regions: Vec<MergedRegion>,
}

impl MergedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Add a merged region.
    ///
    /// Single-cell ranges are ignored; overlapping an existing region is an error.
    pub fn add(&mut self, range: Range) -> Result<(), MergeError> {
        if range.is_single_cell() {
            return Ok(());
        }
        if let Some(existing) = self.regions.iter().find(|r| r.range.intersects(&range)) {
            if existing.range == range {
                return Ok(());
            }
            return Err(MergeError::Overlap {
                new: range,
                existing: existing.range,
            });
        }
        self.regions.push(MergedRegion { range });
        Ok(())
    }

    /// Remove every region intersecting `range`, returning the removed regions.
    pub fn remove_intersecting(&mut self, range: Range) -> Vec<MergedRegion> {
        let mut removed = Vec::new();
        self.regions.retain(|r| {
            if r.range.intersects(&range) {
                removed.push(*r);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove and return every region.
    pub fn take_all(&mut self) -> Vec<MergedRegion> {
        std::mem::take(&mut self.regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(a1: &str) -> Range {
        Range::from_a1(a1).unwrap()
    }

    #[test]
    fn overlapping_merges_are_rejected() {
        let mut merges = MergedRegions::new();
        merges.add(range("A1:B2")).unwrap();
        merges.add(range("A1:B2")).unwrap();
        merges.add(range("C3")).unwrap();
        assert_eq!(merges.len(), 1);

        let err = merges.add(range("B2:C2")).unwrap_err();
        assert_eq!(
            err,
            MergeError::Overlap {
                new: range("B2:C2"),
                existing: range("A1:B2"),
            }
        );
    }

    #[test]
    fn removal_by_intersection() {
        let mut merges = MergedRegions::new();
        merges.add(range("A1:A3")).unwrap();
        merges.add(range("C1:D1")).unwrap();
        assert_eq!(merges.iter().next().map(|r| r.anchor()), Some(CellRef::new(0, 0)));

        let removed = merges.remove_intersecting(range("D1"));
        assert_eq!(removed.len(), 1);
        assert_eq!(merges.len(), 1);
    }
}
