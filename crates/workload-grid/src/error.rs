use thiserror::Error;

use crate::{AddressError, MergeError};

/// Axis of a labelled grid.
///
/// `X` is the header rows above the value region (one level per header row),
/// `Y` the header columns left of it (one level per header column).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Errors raised by grid construction and rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("origin point ({origin_row}, {origin_col}) leaves no value region in a {rows}x{cols} grid")]
    OriginOutOfBounds {
        origin_row: u32,
        origin_col: u32,
        rows: u32,
        cols: u32,
    },
    #[error("matrix shape {actual:?} differs from the value region shape {expected:?}")]
    Shape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("level {level} is out of the {axis} axis level range 1..={levels}")]
    LevelOutOfRange { axis: Axis, level: usize, levels: usize },
    #[error("column width must be a positive number, got {width}")]
    ColumnWidth { width: f64 },
    #[error("sheet name {0:?} already exists in workbook")]
    DuplicateSheet(String),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// A coordinate that could not be resolved to exactly one numeric cell.
///
/// `coordinate` is the row coordinates followed by the column coordinates, as
/// given by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MismatchError {
    #[error("mismatching coordinate {}: no cell matched", format_coordinate(.coordinate))]
    NoMatch { coordinate: Vec<Option<String>> },
    #[error("mismatching coordinate {}: {count} cells matched", format_coordinate(.coordinate))]
    Ambiguous {
        coordinate: Vec<Option<String>>,
        count: usize,
    },
    #[error("mismatching coordinate {}: matched cell holds non-numeric value {value:?}", format_coordinate(.coordinate))]
    NotNumeric {
        coordinate: Vec<Option<String>>,
        value: String,
    },
    #[error("mismatching coordinate {}: {given} {axis} levels given but the axis has {levels}", format_coordinate(.coordinate))]
    LevelOverflow {
        coordinate: Vec<Option<String>>,
        axis: Axis,
        given: usize,
        levels: usize,
    },
}

impl MismatchError {
    pub fn coordinate(&self) -> &[Option<String>] {
        match self {
            MismatchError::NoMatch { coordinate }
            | MismatchError::Ambiguous { coordinate, .. }
            | MismatchError::NotNumeric { coordinate, .. }
            | MismatchError::LevelOverflow { coordinate, .. } => coordinate,
        }
    }
}

/// `(a, *, c)` rendering of a coordinate list; `*` marks a wildcard level.
pub fn format_coordinate(coordinate: &[Option<String>]) -> String {
    let parts: Vec<&str> = coordinate
        .iter()
        .map(|c| c.as_deref().unwrap_or("*"))
        .collect();
    format!("({})", parts.join(", "))
}
