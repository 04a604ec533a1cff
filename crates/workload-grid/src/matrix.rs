use serde::{Deserialize, Serialize};

/// Dense row-major `f64` matrix shaped like a labelled grid's value region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl ValueMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows. Returns `None` for ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        Some(Self {
            rows: n,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] += value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// `(min, max)` over all entries, `None` when the matrix is empty.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_accessors() {
        let mut m = ValueMatrix::zeros(2, 3);
        m.set(1, 2, 4.0);
        m.add(1, 2, 1.0);
        m.add(0, 0, -2.0);
        assert_eq!(m.get(1, 2), 5.0);
        assert_eq!(m.sum(), 3.0);
        assert_eq!(m.min_max(), Some((-2.0, 5.0)));
        assert_eq!(m.row(1), &[0.0, 0.0, 5.0]);
        assert_eq!(ValueMatrix::zeros(0, 0).min_max(), None);
        assert!(ValueMatrix::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_none());
    }
}
