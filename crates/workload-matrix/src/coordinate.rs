//! Coordinate groups, sets and concrete coordinates.
//!
//! A [`CoordinateGroup`] holds one [`DimSpec`] per header level of each axis.
//! Top-level alternatives of the specs span the [`CoordinateSet`]s of the
//! group; multi-valued dimensions inside a set span its concrete
//! [`Coordinate`]s. Both expansions are Cartesian products enumerated lazily,
//! row dimensions outermost.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of one coordinate dimension.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimValue {
    /// Wildcard; the header level is not matched.
    Any,
    One(String),
    /// Every value must resolve.
    Many(Vec<String>),
}

impl DimValue {
    pub fn one(value: impl Into<String>) -> Self {
        Self::One(value.into())
    }

    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::Many(values.into_iter().map(Into::into).collect())
    }

    /// Concrete level values this dimension expands to.
    pub fn expand(&self) -> Vec<Option<&str>> {
        match self {
            DimValue::Any => vec![None],
            DimValue::One(v) => vec![Some(v.as_str())],
            DimValue::Many(vs) => vs.iter().map(|v| Some(v.as_str())).collect(),
        }
    }
}

impl From<&str> for DimValue {
    fn from(value: &str) -> Self {
        DimValue::One(value.to_string())
    }
}

impl From<String> for DimValue {
    fn from(value: String) -> Self {
        DimValue::One(value)
    }
}

impl From<Option<String>> for DimValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(DimValue::Any, DimValue::One)
    }
}

/// A [`DimValue`] chosen for a set, with its diagnostic label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoordinateValue {
    pub value: DimValue,
    pub label: Option<String>,
}

/// Per-dimension input of a [`CoordinateGroup`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimSpec {
    Value(DimValue),
    /// Ordered alternatives, each starting its own set.
    Alternatives(Vec<DimValue>),
    /// Ordered labelled alternatives, each starting its own set.
    Labelled(Vec<(String, DimValue)>),
}

impl DimSpec {
    pub fn any() -> Self {
        DimSpec::Value(DimValue::Any)
    }

    pub fn one(value: impl Into<String>) -> Self {
        DimSpec::Value(DimValue::one(value))
    }

    pub fn many<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        DimSpec::Value(DimValue::many(values))
    }

    fn choices(&self) -> Vec<CoordinateValue> {
        match self {
            DimSpec::Value(value) => vec![CoordinateValue {
                value: value.clone(),
                label: None,
            }],
            DimSpec::Alternatives(values) => values
                .iter()
                .map(|value| CoordinateValue {
                    value: value.clone(),
                    label: None,
                })
                .collect(),
            DimSpec::Labelled(entries) => entries
                .iter()
                .map(|(label, value)| CoordinateValue {
                    value: value.clone(),
                    label: Some(label.clone()),
                })
                .collect(),
        }
    }
}

impl From<DimValue> for DimSpec {
    fn from(value: DimValue) -> Self {
        DimSpec::Value(value)
    }
}

/// Header labels addressing one value cell; `None` skips a level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub rows: Vec<Option<String>>,
    pub cols: Vec<Option<String>>,
}

impl Coordinate {
    pub fn new(rows: Vec<Option<String>>, cols: Vec<Option<String>>) -> Self {
        Self { rows, cols }
    }
}

/// `([r1]-[r2], [c1]-[c2])`, with `*` for wildcard levels.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(f: &mut fmt::Formatter<'_>, values: &[Option<String>]) -> fmt::Result {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str("-")?;
                }
                write!(f, "[{}]", value.as_deref().unwrap_or("*"))?;
            }
            Ok(())
        }
        f.write_str("(")?;
        side(f, &self.rows)?;
        f.write_str(", ")?;
        side(f, &self.cols)?;
        f.write_str(")")
    }
}

/// Mixed-radix counter over `sizes`, last position fastest.
///
/// Yields nothing when any size is zero and one empty combination when there
/// are no positions at all.
#[derive(Clone, Debug)]
struct Odometer {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Odometer {
    fn new(sizes: Vec<usize>) -> Self {
        let next = (!sizes.contains(&0)).then(|| vec![0; sizes.len()]);
        Self { sizes, next }
    }

    fn total(&self) -> usize {
        self.sizes.iter().product()
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        for pos in (0..following.len()).rev() {
            following[pos] += 1;
            if following[pos] < self.sizes[pos] {
                self.next = Some(following);
                break;
            }
            following[pos] = 0;
        }
        Some(current)
    }
}

/// One choice per dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinateSet {
    rows: Vec<CoordinateValue>,
    cols: Vec<CoordinateValue>,
}

impl CoordinateSet {
    pub fn new(rows: Vec<CoordinateValue>, cols: Vec<CoordinateValue>) -> Self {
        Self { rows, cols }
    }

    pub fn rows(&self) -> &[CoordinateValue] {
        &self.rows
    }

    pub fn cols(&self) -> &[CoordinateValue] {
        &self.cols
    }

    /// `[row-labels, col-labels]`, per-dimension labels joined with `-`;
    /// `None` when no dimension is labelled.
    pub fn label(&self) -> Option<String> {
        let join = |values: &[CoordinateValue]| {
            values
                .iter()
                .filter_map(|v| v.label.as_deref())
                .collect::<Vec<_>>()
                .join("-")
        };
        let (rows, cols) = (join(&self.rows), join(&self.cols));
        if rows.is_empty() && cols.is_empty() {
            return None;
        }
        Some(format!("[{rows}, {cols}]"))
    }

    /// Number of concrete coordinates in the set.
    pub fn len(&self) -> usize {
        self.rows
            .iter()
            .chain(&self.cols)
            .map(|v| v.value.expand().len())
            .product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily enumerate the concrete coordinates; each call starts over.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        let axes: Vec<Vec<Option<&str>>> = self
            .rows
            .iter()
            .chain(&self.cols)
            .map(|v| v.value.expand())
            .collect();
        let split = self.rows.len();
        let counter = Odometer::new(axes.iter().map(Vec::len).collect());
        counter.map(move |idx| {
            let mut levels = idx
                .iter()
                .enumerate()
                .map(|(dim, &i)| axes[dim][i].map(str::to_string));
            let rows = levels.by_ref().take(split).collect();
            let cols = levels.collect();
            Coordinate { rows, cols }
        })
    }
}

/// Ordered row and column dimension specs of one work item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateGroup {
    pub rows: Vec<DimSpec>,
    pub cols: Vec<DimSpec>,
}

impl CoordinateGroup {
    pub fn new(rows: Vec<DimSpec>, cols: Vec<DimSpec>) -> Self {
        Self { rows, cols }
    }

    /// Number of sets the group expands to.
    pub fn set_count(&self) -> usize {
        Odometer::new(self.choice_counts()).total()
    }

    fn choice_counts(&self) -> Vec<usize> {
        self.rows
            .iter()
            .chain(&self.cols)
            .map(|spec| spec.choices().len())
            .collect()
    }

    /// Lazily enumerate the coordinate sets in order; each call starts over.
    pub fn sets(&self) -> impl Iterator<Item = CoordinateSet> + '_ {
        let choices: Vec<Vec<CoordinateValue>> = self
            .rows
            .iter()
            .chain(&self.cols)
            .map(DimSpec::choices)
            .collect();
        let split = self.rows.len();
        let counter = Odometer::new(choices.iter().map(Vec::len).collect());
        counter.map(move |idx| {
            let mut picked = idx
                .iter()
                .enumerate()
                .map(|(dim, &i)| choices[dim][i].clone());
            let rows = picked.by_ref().take(split).collect();
            let cols = picked.collect();
            CoordinateSet { rows, cols }
        })
    }
}
