//! `workload-grid` models formatted worksheets and the labelled reference maps
//! read from them.
//!
//! The crate covers:
//! - a dense in-memory [`Grid`] with values, interned styles, merged regions and
//!   column widths, plus a [`Workbook`] of named grids
//! - [`LabelledGrid`], which splits a sheet at an [`OriginPoint`] into header
//!   levels and a value region, locates cells by per-level labels, and renders
//!   value matrices back onto the formatted sheet (optionally as a heatmap or
//!   down-mixed by header runs)

mod address;
mod error;
mod grid;
pub mod heatmap;
mod labelled;
mod matrix;
mod merge;
mod style;
mod value;
mod workbook;

pub use address::{AddressError, CellRef, Range, MAX_COLS, MAX_ROWS};
pub use error::{format_coordinate, Axis, GridError, MismatchError};
pub use grid::{CellSlot, Grid, VerticalMergeMode};
pub use heatmap::{lerp_color, Heatmap, HeatmapPalette};
pub use labelled::{label_runs, LabelledGrid, LocatedCell, OriginPoint};
pub use matrix::ValueMatrix;
pub use merge::{MergeError, MergedRegion, MergedRegions};
pub use style::{
    Alignment, Border, Color, Fill, Font, HorizontalAlignment, LineStyle, Style, StyleTable,
    VerticalAlignment,
};
pub use value::CellValue;
pub use workbook::Workbook;
