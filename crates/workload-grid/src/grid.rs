use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::style::DEFAULT_STYLE;
use crate::{
    AddressError, CellRef, CellValue, Color, Fill, GridError, MergedRegion, MergedRegions, Range,
    Style, StyleTable,
};

static EMPTY: CellValue = CellValue::Empty;

/// One stored cell: its value plus an id into the grid's [`StyleTable`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSlot {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default)]
    pub style_id: u32,
}

/// How [`Grid::merge_vertical`] decides where a run of cells ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalMergeMode {
    /// A labelled cell absorbs the blank cells below it.
    Blank,
    /// Consecutive identical values (blanks included) form a run.
    Same,
    /// Consecutive identical labels form a run; blank cells join the run above.
    All,
}

/// A named, dense, row-major worksheet.
///
/// The grid grows on write; reads outside the stored extent return
/// [`CellValue::Empty`] and the default style. Values of merged cells other
/// than the anchor are cleared on merge, matching spreadsheet semantics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Grid {
    name: String,
    rows: u32,
    cols: u32,
    cells: Vec<CellSlot>,
    styles: StyleTable,
    merges: MergedRegions,
    column_widths: BTreeMap<u32, f64>,
}

impl Grid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            styles: StyleTable::new(),
            merges: MergedRegions::new(),
            column_widths: BTreeMap::new(),
        }
    }

    /// Build a grid from row-major values.
    pub fn from_rows<R, V>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut grid = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                grid.set_value(CellRef::new(r as u32, c as u32), value);
            }
        }
        grid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn row_count(&self) -> u32 {
        self.rows
    }

    pub fn col_count(&self) -> u32 {
        self.cols
    }

    fn index(&self, cell: CellRef) -> Option<usize> {
        (cell.row < self.rows && cell.col < self.cols)
            .then(|| cell.row as usize * self.cols as usize + cell.col as usize)
    }

    fn ensure_size(&mut self, rows: u32, cols: u32) {
        let rows = rows.max(self.rows);
        let cols = cols.max(self.cols);
        if cols != self.cols {
            let mut cells = Vec::with_capacity(rows as usize * cols as usize);
            for r in 0..self.rows as usize {
                let start = r * self.cols as usize;
                cells.extend_from_slice(&self.cells[start..start + self.cols as usize]);
                cells.resize(cells.len() + (cols - self.cols) as usize, CellSlot::default());
            }
            self.cells = cells;
            self.cols = cols;
        }
        if rows != self.rows {
            self.cells
                .resize(rows as usize * cols as usize, CellSlot::default());
            self.rows = rows;
        }
    }

    fn slot_mut(&mut self, cell: CellRef) -> &mut CellSlot {
        self.ensure_size(cell.row + 1, cell.col + 1);
        let idx = cell.row as usize * self.cols as usize + cell.col as usize;
        &mut self.cells[idx]
    }

    pub fn value(&self, cell: CellRef) -> &CellValue {
        self.index(cell).map_or(&EMPTY, |idx| &self.cells[idx].value)
    }

    pub fn set_value(&mut self, cell: CellRef, value: impl Into<CellValue>) {
        self.slot_mut(cell).value = value.into();
    }

    pub fn value_a1(&self, a1: &str) -> Result<&CellValue, AddressError> {
        Ok(self.value(CellRef::from_a1(a1)?))
    }

    /// Append a row of values below the current extent.
    pub fn append_row<V: Into<CellValue>>(&mut self, values: impl IntoIterator<Item = V>) {
        let row = self.rows;
        let mut wrote = false;
        for (c, value) in values.into_iter().enumerate() {
            self.set_value(CellRef::new(row, c as u32), value);
            wrote = true;
        }
        if !wrote {
            self.ensure_size(row + 1, self.cols);
        }
    }

    pub fn style_id(&self, cell: CellRef) -> u32 {
        self.index(cell).map_or(0, |idx| self.cells[idx].style_id)
    }

    pub fn style(&self, cell: CellRef) -> &Style {
        self.styles
            .get(self.style_id(cell))
            .unwrap_or(&DEFAULT_STYLE)
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn set_style(&mut self, cell: CellRef, style: Style) {
        let id = self.styles.intern(style);
        self.slot_mut(cell).style_id = id;
    }

    /// Apply `edit` to a copy of each cell's style in `range`.
    pub fn update_styles(&mut self, range: Range, mut edit: impl FnMut(&mut Style)) {
        for cell in range.cells() {
            let mut style = self.style(cell).clone();
            edit(&mut style);
            self.set_style(cell, style);
        }
    }

    /// Give `cell` a solid background, keeping the rest of its style.
    pub fn set_fill(&mut self, cell: CellRef, color: Color) {
        self.update_styles(Range::new(cell, cell), |style| {
            style.fill = Some(Fill::solid(color));
        });
    }

    pub fn merged_regions(&self) -> &MergedRegions {
        &self.merges
    }

    /// Merge `range`, keeping only the anchor (top-left) value.
    pub fn merge_range(&mut self, range: Range) -> Result<(), GridError> {
        self.merges.add(range)?;
        if range.is_single_cell() {
            return Ok(());
        }
        self.ensure_size(range.end.row + 1, range.end.col + 1);
        for cell in range.cells().skip(1) {
            self.set_value(cell, CellValue::Empty);
        }
        Ok(())
    }

    /// Remove every merged region intersecting `range`, copying each anchor
    /// value over its whole region. Returns the number of regions removed.
    pub fn unmerge_range(&mut self, range: Range) -> usize {
        let removed = self.merges.remove_intersecting(range);
        self.fill_regions(&removed);
        removed.len()
    }

    /// Remove all merged regions, copying each anchor value over its region.
    ///
    /// Applying this more than once is a no-op.
    pub fn unmerge_and_fill(&mut self) {
        let removed = self.merges.take_all();
        self.fill_regions(&removed);
    }

    fn fill_regions(&mut self, regions: &[MergedRegion]) {
        for region in regions {
            let value = self.value(region.anchor()).clone();
            for cell in region.range.cells() {
                self.set_value(cell, value.clone());
            }
        }
    }

    /// Merge runs of cells down column `col` according to `mode`.
    ///
    /// Returns the number of merged regions created.
    pub fn merge_vertical(&mut self, col: u32, mode: VerticalMergeMode) -> Result<usize, GridError> {
        let rows = self.rows;
        let mut start = 0u32;
        let mut last: Option<CellValue> = None;
        let mut created = 0usize;
        for row in 0..=rows {
            let current = (row < rows).then(|| self.value(CellRef::new(row, col)).clone());
            let boundary = match &current {
                None => true,
                Some(v) => match mode {
                    VerticalMergeMode::Blank => !v.is_blank(),
                    VerticalMergeMode::Same => last.as_ref() != Some(v),
                    VerticalMergeMode::All => !v.is_blank() && last.as_ref() != Some(v),
                },
            };
            if !boundary {
                continue;
            }
            if row > 0 && start < row - 1 {
                self.merge_range(Range::new(
                    CellRef::new(start, col),
                    CellRef::new(row - 1, col),
                ))?;
                created += 1;
            }
            start = row;
            if mode != VerticalMergeMode::Blank {
                last = current;
            }
        }
        Ok(created)
    }

    /// Replicate the single-column vertical merges of `source_col` onto `target_cols`.
    pub fn copy_vertical_merges(&mut self, source_col: u32, target_cols: &[u32]) -> Result<(), GridError> {
        let spans: Vec<(u32, u32)> = self
            .merges
            .iter()
            .filter(|m| m.range.start.col == source_col && m.range.end.col == source_col)
            .map(|m| (m.range.start.row, m.range.end.row))
            .collect();
        for &col in target_cols {
            for &(begin, end) in &spans {
                self.merge_range(Range::new(CellRef::new(begin, col), CellRef::new(end, col)))?;
            }
        }
        Ok(())
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) -> Result<(), GridError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(GridError::ColumnWidth { width });
        }
        self.column_widths.insert(col, width);
        Ok(())
    }

    /// Set several column widths keyed by column letters (`"A"`, `"AB"`).
    pub fn set_column_widths<'a>(
        &mut self,
        widths: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<(), GridError> {
        for (letters, width) in widths {
            let col = crate::address::column_index(letters)?;
            self.set_column_width(col, width)?;
        }
        Ok(())
    }

    pub fn row_is_blank(&self, row: u32) -> bool {
        (0..self.cols).all(|c| self.value(CellRef::new(row, c)).is_blank())
    }

    pub fn col_is_blank(&self, col: u32) -> bool {
        (0..self.rows).all(|r| self.value(CellRef::new(r, col)).is_blank())
    }

    /// Bounding box of all non-blank values.
    pub fn used_range(&self) -> Option<Range> {
        let first_row = (0..self.rows).find(|&r| !self.row_is_blank(r))?;
        let last_row = (0..self.rows).rev().find(|&r| !self.row_is_blank(r))?;
        let first_col = (0..self.cols).find(|&c| !self.col_is_blank(c))?;
        let last_col = (0..self.cols).rev().find(|&c| !self.col_is_blank(c))?;
        Some(Range::new(
            CellRef::new(first_row, first_col),
            CellRef::new(last_row, last_col),
        ))
    }

    /// Copy values, styles, column widths and fully contained merges of `source`
    /// into `target`, placing `source.start` at `at`.
    pub fn copy_region_into(
        &self,
        source: Range,
        target: &mut Grid,
        at: CellRef,
    ) -> Result<(), GridError> {
        let to_target = |cell: CellRef| {
            CellRef::new(
                at.row + (cell.row - source.start.row),
                at.col + (cell.col - source.start.col),
            )
        };
        let dest = Range::new(at, to_target(source.end));
        target.merges.remove_intersecting(dest);

        for cell in source.cells() {
            let dst = to_target(cell);
            target.set_value(dst, self.value(cell).clone());
            let style = self.style(cell);
            if *style != Style::default() || target.style_id(dst) != 0 {
                target.set_style(dst, style.clone());
            }
        }
        for col in source.start.col..=source.end.col {
            if let Some(width) = self.column_width(col) {
                target
                    .column_widths
                    .insert(at.col + (col - source.start.col), width);
            }
        }
        for region in self.merges.iter() {
            if source.contains_range(&region.range) {
                target.merge_range(Range::new(
                    to_target(region.range.start),
                    to_target(region.range.end),
                ))?;
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        #[derive(Deserialize)]
        struct Helper {
            name: String,
            #[serde(default)]
            rows: u32,
            #[serde(default)]
            cols: u32,
            #[serde(default)]
            cells: Vec<CellSlot>,
            #[serde(default)]
            styles: StyleTable,
            #[serde(default)]
            merges: MergedRegions,
            #[serde(default)]
            column_widths: BTreeMap<u32, f64>,
        }

        let helper = Helper::deserialize(deserializer)?;
        let expected = helper.rows as usize * helper.cols as usize;
        if helper.cells.len() != expected {
            return Err(D::Error::custom(format!(
                "grid {:?} declares {}x{} cells but stores {}",
                helper.name,
                helper.rows,
                helper.cols,
                helper.cells.len()
            )));
        }
        if let Some(bad) = helper
            .cells
            .iter()
            .find(|c| c.style_id as usize >= helper.styles.len())
        {
            return Err(D::Error::custom(format!(
                "cell references unknown style id {}",
                bad.style_id
            )));
        }
        Ok(Grid {
            name: helper.name,
            rows: helper.rows,
            cols: helper.cols,
            cells: helper.cells,
            styles: helper.styles,
            merges: helper.merges,
            column_widths: helper.column_widths,
        })
    }
}
