use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest row count a sheet may address (1,048,576).
pub const MAX_ROWS: u32 = 1 << 20;

/// Largest column count a sheet may address (16,384, column `XFD`).
pub const MAX_COLS: u32 = 1 << 14;

/// Errors produced while parsing A1 references.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty A1 reference")]
    Empty,
    #[error("missing column in A1 reference")]
    MissingColumn,
    #[error("missing row in A1 reference")]
    MissingRow,
    #[error("invalid column in A1 reference")]
    InvalidColumn,
    #[error("invalid row in A1 reference")]
    InvalidRow,
    #[error("trailing characters in A1 reference")]
    TrailingCharacters,
}

/// A 0-indexed cell position: `CellRef::new(0, 0)` is `A1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub const fn offset(self, rows: u32, cols: u32) -> Self {
        Self::new(self.row + rows, self.col + cols)
    }

    pub fn to_a1(self) -> String {
        self.to_string()
    }

    /// Parse `B7`, `$B$7` or `b7`.
    pub fn from_a1(a1: &str) -> Result<Self, AddressError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let s = s.strip_prefix('$').unwrap_or(s);
        let letters_end = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (letters, rest) = s.split_at(letters_end);
        if letters.is_empty() {
            return Err(AddressError::MissingColumn);
        }
        let col = column_index(letters)?;

        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (digits, trailing) = rest.split_at(digits_end);
        if digits.is_empty() {
            return Err(AddressError::MissingRow);
        }
        if !trailing.is_empty() {
            return Err(AddressError::TrailingCharacters);
        }
        match digits.parse::<u32>() {
            Ok(row @ 1..=MAX_ROWS) => Ok(Self::new(row - 1, col)),
            _ => Err(AddressError::InvalidRow),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Inclusive rectangle of cells with `start <= end` on both axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Rectangle spanned by two opposite corners, in any order.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// `rows x cols` cells anchored at `start`; `None` for an empty extent.
    pub fn with_extent(start: CellRef, rows: u32, cols: u32) -> Option<Self> {
        (rows > 0 && cols > 0).then(|| Self::new(start, start.offset(rows - 1, cols - 1)))
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    pub fn contains_range(&self, other: &Range) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.start.row.max(other.start.row) <= self.end.row.min(other.end.row)
            && self.start.col.max(other.start.col) <= self.end.col.min(other.end.col)
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    /// Cells of the range in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> {
        RangeIter {
            range: *self,
            next: Some(self.start),
        }
    }

    /// Parse `A1:B2` or a single cell such as `C3`.
    pub fn from_a1(a1: &str) -> Result<Self, AddressError> {
        let s = a1.trim();
        let (a, b) = s.split_once(':').unwrap_or((s, s));
        Ok(Range::new(CellRef::from_a1(a)?, CellRef::from_a1(b)?))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            return write!(f, "{}", self.start);
        }
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Row-major iterator over the cells of a [`Range`].
#[derive(Clone, Debug)]
struct RangeIter {
    range: Range,
    next: Option<CellRef>,
}

impl Iterator for RangeIter {
    type Item = CellRef;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        let Range { start, end } = self.range;
        self.next = if cell.col < end.col {
            Some(CellRef::new(cell.row, cell.col + 1))
        } else if cell.row < end.row {
            Some(CellRef::new(cell.row + 1, start.col))
        } else {
            None
        };
        Some(cell)
    }
}

/// Column letters of a 0-based column index (`0 -> A`, `26 -> AA`).
fn column_name(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col as u64 + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// 0-based column index of column letters, case-insensitive.
pub fn column_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::InvalidColumn);
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() || n > MAX_COLS {
            return Err(AddressError::InvalidColumn);
        }
        n = n * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    if n > MAX_COLS {
        return Err(AddressError::InvalidColumn);
    }
    Ok(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_roundtrip() {
        let c = CellRef::new(0, 0);
        assert_eq!(c.to_a1(), "A1");
        assert_eq!(CellRef::from_a1("$A$1").unwrap(), c);

        let c2 = CellRef::new(31, 54);
        assert_eq!(c2.to_a1(), "BC32");
        assert_eq!(CellRef::from_a1("bc32").unwrap(), c2);
        assert_eq!(CellRef::from_a1("12"), Err(AddressError::MissingColumn));
        assert_eq!(CellRef::from_a1("B"), Err(AddressError::MissingRow));
        assert_eq!(CellRef::from_a1(" "), Err(AddressError::Empty));
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(MAX_COLS - 1), "XFD");
        assert_eq!(column_index("AA").unwrap(), 26);
        assert_eq!(column_index("xfd").unwrap(), MAX_COLS - 1);
        assert_eq!(column_index("A1"), Err(AddressError::InvalidColumn));
        assert_eq!(column_index("XFE"), Err(AddressError::InvalidColumn));
    }

    #[test]
    fn range_parsing_and_iteration() {
        let r = Range::from_a1("B2:A1").unwrap();
        assert_eq!(r.start, CellRef::new(0, 0));
        assert_eq!(r.end, CellRef::new(1, 1));
        assert_eq!(r.cells().count(), 4);
        assert_eq!(r.cells().nth(1), Some(CellRef::new(0, 1)));
        assert_eq!(r.to_string(), "A1:B2");

        assert!(Range::from_a1("C3").unwrap().is_single_cell());
        assert_eq!(Range::from_a1("A0"), Err(AddressError::InvalidRow));
        assert_eq!(Range::from_a1("A1x"), Err(AddressError::TrailingCharacters));
    }

    #[test]
    fn intersection_and_containment() {
        let a = Range::from_a1("A1:C3").unwrap();
        let b = Range::from_a1("C3:D4").unwrap();
        let c = Range::from_a1("D1:D2").unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_range(&Range::from_a1("B2:C3").unwrap()));
        assert!(!a.contains_range(&b));
        assert_eq!((a.width(), a.height()), (3, 3));
        assert_eq!(Range::with_extent(CellRef::new(1, 1), 0, 3), None);
    }
}
