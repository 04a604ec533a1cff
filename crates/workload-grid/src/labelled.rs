//! Labelled view over a formatted reference sheet.
//!
//! A reference sheet is laid out as
//!
//! ```text
//!            | x-axis header rows (one level per row)
//! -----------+-------------------------------------
//!   y-axis   |
//!   header   |            value region
//!   columns  |
//! ```
//!
//! The [`OriginPoint`] gives the number of header rows and header columns,
//! i.e. the 0-based position of the first value cell once blank padding around
//! the sheet is removed.

use std::ops::Range as Span;

use serde::{Deserialize, Serialize};

use crate::error::MismatchError;
use crate::{
    Axis, CellRef, CellValue, Grid, GridError, Heatmap, HeatmapPalette, Range, ValueMatrix,
};

/// Split point between header regions and the value region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginPoint {
    /// Number of x-axis header rows.
    pub header_rows: u32,
    /// Number of y-axis header columns.
    pub header_cols: u32,
}

impl OriginPoint {
    pub const fn new(header_rows: u32, header_cols: u32) -> Self {
        Self {
            header_rows,
            header_cols,
        }
    }
}

impl Default for OriginPoint {
    fn default() -> Self {
        Self::new(2, 3)
    }
}

/// The single cell a coordinate resolved to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocatedCell {
    row: usize,
    col: usize,
    value: f64,
}

impl LocatedCell {
    /// Numeric value held by the cell.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// `(row, col)` index within the value region.
    pub fn index(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

/// A sheet decoded into a dense value region plus per-level header labels.
///
/// Immutable after construction. Merged regions of the source are resolved
/// by fill-copy before any label or value is read.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelledGrid {
    source: Grid,
    origin: OriginPoint,
    /// Top-left of the non-blank window inside `source`.
    window: CellRef,
    value_rows: usize,
    value_cols: usize,
    values: Vec<CellValue>,
    x_axis: Vec<Vec<Option<String>>>,
    y_axis: Vec<Vec<Option<String>>>,
}

impl LabelledGrid {
    pub fn new(source: &Grid, origin: OriginPoint) -> Result<Self, GridError> {
        let mut unmerged = source.clone();
        unmerged.unmerge_and_fill();

        let out_of_bounds = |rows: u32, cols: u32| GridError::OriginOutOfBounds {
            origin_row: origin.header_rows,
            origin_col: origin.header_cols,
            rows,
            cols,
        };
        let used = unmerged.used_range().ok_or_else(|| out_of_bounds(0, 0))?;
        let (rows, cols) = (used.height(), used.width());
        if origin.header_rows >= rows || origin.header_cols >= cols {
            return Err(out_of_bounds(rows, cols));
        }

        let at = |r: u32, c: u32| unmerged.value(used.start.offset(r, c));
        let (hr, hc) = (origin.header_rows, origin.header_cols);

        let values = (hr..rows)
            .flat_map(|r| (hc..cols).map(move |c| (r, c)))
            .map(|(r, c)| at(r, c).clone())
            .collect();
        let x_axis = (0..hr)
            .map(|level| (hc..cols).map(|c| at(level, c).label()).collect())
            .collect();
        let y_axis = (0..hc)
            .map(|level| (hr..rows).map(|r| at(r, level).label()).collect())
            .collect();

        Ok(Self {
            source: source.clone(),
            origin,
            window: used.start,
            value_rows: (rows - hr) as usize,
            value_cols: (cols - hc) as usize,
            values,
            x_axis,
            y_axis,
        })
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn source(&self) -> &Grid {
        &self.source
    }

    pub fn origin(&self) -> OriginPoint {
        self.origin
    }

    /// `(rows, cols)` of the value region.
    pub fn value_shape(&self) -> (usize, usize) {
        (self.value_rows, self.value_cols)
    }

    /// All x-axis levels, outermost first; each as long as the value region is wide.
    pub fn x_levels(&self) -> &[Vec<Option<String>>] {
        &self.x_axis
    }

    /// All y-axis levels, outermost first; each as long as the value region is tall.
    pub fn y_levels(&self) -> &[Vec<Option<String>>] {
        &self.y_axis
    }

    fn levels(&self, axis: Axis) -> &[Vec<Option<String>>] {
        match axis {
            Axis::X => &self.x_axis,
            Axis::Y => &self.y_axis,
        }
    }

    /// Header labels of one 1-based level.
    pub fn level(&self, axis: Axis, level: usize) -> Result<&[Option<String>], GridError> {
        let levels = self.levels(axis);
        if level == 0 || level > levels.len() {
            return Err(GridError::LevelOutOfRange {
                axis,
                level,
                levels: levels.len(),
            });
        }
        Ok(&levels[level - 1])
    }

    pub fn x_level(&self, level: usize) -> Result<&[Option<String>], GridError> {
        self.level(Axis::X, level)
    }

    pub fn y_level(&self, level: usize) -> Result<&[Option<String>], GridError> {
        self.level(Axis::Y, level)
    }

    pub fn value_at(&self, row: usize, col: usize) -> &CellValue {
        &self.values[row * self.value_cols + col]
    }

    /// Numeric reference value at a value-region index.
    pub fn reference_value(&self, row: usize, col: usize) -> Option<f64> {
        self.value_at(row, col).as_number()
    }

    /// Position of a value-region index in the source sheet.
    pub fn value_cell(&self, row: usize, col: usize) -> CellRef {
        self.window.offset(
            self.origin.header_rows + row as u32,
            self.origin.header_cols + col as u32,
        )
    }

    /// Find the unique numeric cell addressed by per-level header labels.
    ///
    /// `rows` is matched against the y-axis levels and `cols` against the x-axis
    /// levels. `None` skips a level. Lists shorter than the axis depth are
    /// aligned to the innermost levels (trailing `None`s are dropped first), so a
    /// single label matches the deepest level only.
    pub fn locate_cell<R, C>(
        &self,
        rows: &[Option<R>],
        cols: &[Option<C>],
    ) -> Result<LocatedCell, MismatchError>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let coordinate = || -> Vec<Option<String>> {
            rows.iter()
                .map(owned_label)
                .chain(cols.iter().map(owned_label))
                .collect()
        };

        let row_mask = self
            .axis_mask(Axis::Y, rows)
            .map_err(|(given, levels)| MismatchError::LevelOverflow {
                coordinate: coordinate(),
                axis: Axis::Y,
                given,
                levels,
            })?;
        let col_mask = self
            .axis_mask(Axis::X, cols)
            .map_err(|(given, levels)| MismatchError::LevelOverflow {
                coordinate: coordinate(),
                axis: Axis::X,
                given,
                levels,
            })?;

        let matched_rows: Vec<usize> = positions(&row_mask);
        let matched_cols: Vec<usize> = positions(&col_mask);
        let count = matched_rows.len() * matched_cols.len();
        match count {
            0 => Err(MismatchError::NoMatch {
                coordinate: coordinate(),
            }),
            1 => {
                let (row, col) = (matched_rows[0], matched_cols[0]);
                let cell = self.value_at(row, col);
                match cell.as_number() {
                    Some(value) => Ok(LocatedCell { row, col, value }),
                    None => Err(MismatchError::NotNumeric {
                        coordinate: coordinate(),
                        value: cell.to_string(),
                    }),
                }
            }
            count => Err(MismatchError::Ambiguous {
                coordinate: coordinate(),
                count,
            }),
        }
    }

    /// Boolean mask over one axis; `Err((given, levels))` when too many levels are given.
    fn axis_mask<S: AsRef<str>>(
        &self,
        axis: Axis,
        coords: &[Option<S>],
    ) -> Result<Vec<bool>, (usize, usize)> {
        let levels = self.levels(axis);
        let len = match axis {
            Axis::X => self.value_cols,
            Axis::Y => self.value_rows,
        };
        let significant = coords.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        let coords = &coords[..significant];
        if coords.len() > levels.len() {
            return Err((coords.len(), levels.len()));
        }
        let pad = levels.len() - coords.len();

        let mut mask = vec![true; len];
        for (i, coord) in coords.iter().enumerate() {
            let Some(wanted) = coord else {
                continue;
            };
            let wanted: &str = wanted.as_ref();
            for (m, label) in mask.iter_mut().zip(&levels[pad + i]) {
                *m &= label.as_deref() == Some(wanted);
            }
            if !mask.contains(&true) {
                break;
            }
        }
        Ok(mask)
    }

    fn check_shape(&self, values: &ValueMatrix) -> Result<(), GridError> {
        if values.shape() != self.value_shape() {
            return Err(GridError::Shape {
                expected: self.value_shape(),
                actual: values.shape(),
            });
        }
        Ok(())
    }

    /// Write `values` into a fresh copy of the formatted source sheet.
    ///
    /// Merged regions reaching into the value region are split first so every
    /// written value stays visible. With a palette, each written cell is filled
    /// by heatmap color; positions whose reference cell holds no number get the
    /// palette's missing shade.
    pub fn render_matrix(
        &self,
        values: &ValueMatrix,
        palette: Option<&HeatmapPalette>,
    ) -> Result<Grid, GridError> {
        self.check_shape(values)?;
        let mut out = self.source.clone();
        if let Some(region) = Range::with_extent(
            self.value_cell(0, 0),
            self.value_rows as u32,
            self.value_cols as u32,
        ) {
            let split = out.unmerge_range(region);
            if split > 0 {
                log::debug!("{:?}: split {split} merged regions in the value region", self.name());
            }
        }
        let heatmap = heatmap_for(values, palette);
        for i in 0..self.value_rows {
            for j in 0..self.value_cols {
                let cell = self.value_cell(i, j);
                let value = values.get(i, j);
                out.set_value(cell, value);
                if let Some(heatmap) = &heatmap {
                    let color = if self.reference_value(i, j).is_none() {
                        heatmap.palette().missing
                    } else {
                        heatmap.color_for(value)
                    };
                    out.set_fill(cell, color);
                }
            }
        }
        Ok(out)
    }

    /// Render `values` after summing runs of equal header labels.
    ///
    /// `collapse_x` / `collapse_y` pick the 1-based header level whose label runs
    /// are merged on that axis. A collapsed axis gets a single header level of
    /// run labels; an uncollapsed axis keeps a copy of the original header block.
    ///
    /// Unlike [`render_matrix`](Self::render_matrix), the heatmap never uses the
    /// missing shade: a summed cell has no single reference cell to check.
    pub fn render_downmixed(
        &self,
        values: &ValueMatrix,
        collapse_x: Option<usize>,
        collapse_y: Option<usize>,
        palette: Option<&HeatmapPalette>,
    ) -> Result<Grid, GridError> {
        if collapse_x.is_none() && collapse_y.is_none() {
            log::warn!(
                "down-mix of {:?} requested without a collapse level; rendering full matrix",
                self.name()
            );
            return self.render_matrix(values, palette);
        }
        self.check_shape(values)?;

        let x_runs = collapse_x
            .map(|level| self.level(Axis::X, level).map(label_runs))
            .transpose()?;
        let y_runs = collapse_y
            .map(|level| self.level(Axis::Y, level).map(label_runs))
            .transpose()?;
        let mixed = downmix(values, y_runs.as_deref(), x_runs.as_deref());

        let (hr, hc) = (self.origin.header_rows, self.origin.header_cols);
        let op_r = if x_runs.is_some() { 1 } else { hr };
        let op_c = if y_runs.is_some() { 1 } else { hc };
        let mut out = Grid::new(self.source.name());

        match &x_runs {
            Some(runs) => {
                for (j, (label, _)) in runs.iter().enumerate() {
                    out.set_value(CellRef::new(0, op_c + j as u32), label.clone());
                }
            }
            None => {
                if let Some(header) =
                    Range::with_extent(self.window.offset(0, hc), hr, self.value_cols as u32)
                {
                    self.source
                        .copy_region_into(header, &mut out, CellRef::new(0, op_c))?;
                }
            }
        }

        match &y_runs {
            Some(runs) => {
                for (i, (label, _)) in runs.iter().enumerate() {
                    out.set_value(CellRef::new(op_r + i as u32, 0), label.clone());
                }
            }
            None => {
                if let Some(header) =
                    Range::with_extent(self.window.offset(hr, 0), self.value_rows as u32, hc)
                {
                    self.source
                        .copy_region_into(header, &mut out, CellRef::new(op_r, 0))?;
                }
            }
        }

        if let (None, Some(level)) = (&x_runs, collapse_y) {
            let corner = Range::with_extent(self.window.offset(0, level as u32 - 1), hr, 1);
            if let Some(corner) = corner {
                self.source
                    .copy_region_into(corner, &mut out, CellRef::new(0, 0))?;
            }
        }

        let heatmap = heatmap_for(&mixed, palette);
        let (rows, cols) = mixed.shape();
        for i in 0..rows {
            for j in 0..cols {
                let cell = CellRef::new(op_r + i as u32, op_c + j as u32);
                let value = mixed.get(i, j);
                out.set_value(cell, value);
                if let Some(heatmap) = &heatmap {
                    out.set_fill(cell, heatmap.color_for(value));
                }
            }
        }
        Ok(out)
    }
}

fn owned_label<S: AsRef<str>>(label: &Option<S>) -> Option<String> {
    label.as_ref().map(|s| {
        let s: &str = s.as_ref();
        s.to_string()
    })
}

fn positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &m)| m.then_some(i))
        .collect()
}

fn heatmap_for<'a>(values: &ValueMatrix, palette: Option<&'a HeatmapPalette>) -> Option<Heatmap<'a>> {
    let palette = palette?;
    let (min, max) = values.min_max()?;
    Some(Heatmap::new(palette, min, max))
}

/// Runs of equal adjacent labels, with the index span each run covers.
pub fn label_runs(series: &[Option<String>]) -> Vec<(Option<String>, Span<usize>)> {
    let mut runs: Vec<(Option<String>, Span<usize>)> = Vec::new();
    for (i, label) in series.iter().enumerate() {
        match runs.last_mut() {
            Some((current, span)) if current == label => span.end = i + 1,
            _ => runs.push((label.clone(), i..i + 1)),
        }
    }
    runs
}

/// Sum matrix rows over `row_runs` and columns over `col_runs` (`None` keeps the axis).
fn downmix(
    values: &ValueMatrix,
    row_runs: Option<&[(Option<String>, Span<usize>)]>,
    col_runs: Option<&[(Option<String>, Span<usize>)]>,
) -> ValueMatrix {
    let (rows, cols) = values.shape();
    let identity = |n: usize| -> Vec<Span<usize>> { (0..n).map(|i| i..i + 1).collect() };
    let row_spans: Vec<Span<usize>> =
        row_runs.map_or_else(|| identity(rows), |r| r.iter().map(|(_, s)| s.clone()).collect());
    let col_spans: Vec<Span<usize>> =
        col_runs.map_or_else(|| identity(cols), |r| r.iter().map(|(_, s)| s.clone()).collect());

    let mut out = ValueMatrix::zeros(row_spans.len(), col_spans.len());
    for (gi, rs) in row_spans.iter().enumerate() {
        for (gj, cs) in col_spans.iter().enumerate() {
            let total = rs
                .clone()
                .flat_map(|i| cs.clone().map(move |j| (i, j)))
                .map(|(i, j)| values.get(i, j))
                .sum();
            out.set(gi, gj, total);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_runs_group_adjacent_equal_labels() {
        let series = vec![
            Some("a".to_string()),
            Some("a".to_string()),
            None,
            None,
            Some("a".to_string()),
        ];
        let runs = label_runs(&series);
        assert_eq!(
            runs,
            vec![
                (Some("a".to_string()), 0..2),
                (None, 2..4),
                (Some("a".to_string()), 4..5),
            ]
        );
        assert!(label_runs(&[]).is_empty());
    }

    #[test]
    fn downmix_sums_runs_on_both_axes() {
        let values =
            ValueMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let cols = vec![(None, 0..2), (None, 2..3)];
        let rows = vec![(None, 0..2)];
        let mixed = downmix(&values, Some(&rows), Some(&cols));
        assert_eq!(mixed.to_rows(), vec![vec![12.0, 9.0]]);
        assert_eq!(downmix(&values, None, None), values);
    }
}
