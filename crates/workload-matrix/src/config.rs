use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use workload_grid::{HeatmapPalette, OriginPoint};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid matrix configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("hours_per_day must be a positive number, got {0}")]
    HoursPerDay(f64),
    #[error("{axis} collapse level must be at least 1")]
    CollapseLevel { axis: &'static str },
}

/// How an item's workload is split across the cells it resolved to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionPolicy {
    /// Rate of each cell is its standard value over the sum of standard values.
    #[default]
    Proportional,
    /// `1 / N` per cell.
    Equal,
}

impl AttributionPolicy {
    /// Attribution rate per cell for the given standard values.
    ///
    /// A proportional split over a zero (or non-finite) total falls back to an
    /// equal split.
    pub fn rates(self, standards: &[f64]) -> Vec<f64> {
        let n = standards.len();
        if n == 0 {
            return Vec::new();
        }
        let equal = || vec![1.0 / n as f64; n];
        match self {
            AttributionPolicy::Equal => equal(),
            AttributionPolicy::Proportional => {
                let total: f64 = standards.iter().sum();
                if total == 0.0 || !total.is_finite() {
                    log::warn!(
                        "standard values {standards:?} sum to {total}; splitting workload equally"
                    );
                    return equal();
                }
                standards.iter().map(|s| s / total).collect()
            }
        }
    }
}

/// Unit of cumulative workload sheets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadUnit {
    #[default]
    Day,
    Hour,
}

impl fmt::Display for WorkloadUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkloadUnit::Day => "day",
            WorkloadUnit::Hour => "hour",
        })
    }
}

/// Column labels used for items without a dedicated reference column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateLabels {
    pub unlabeled_task: String,
    pub unlabeled_subtask: String,
    pub management: String,
}

impl Default for CoordinateLabels {
    fn default() -> Self {
        Self {
            unlabeled_task: "unlabeled task".to_string(),
            unlabeled_subtask: "unlabeled subtask".to_string(),
            management: "management".to_string(),
        }
    }
}

/// Rendering options of the matrix workbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub heatmap: bool,
    /// 1-based x-axis level whose label runs are summed.
    pub collapse_x: Option<usize>,
    /// 1-based y-axis level whose label runs are summed.
    pub collapse_y: Option<usize>,
    pub palette: HeatmapPalette,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            heatmap: true,
            collapse_x: None,
            collapse_y: None,
            palette: HeatmapPalette::default(),
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn is_downmixed(&self) -> bool {
        self.collapse_x.is_some() || self.collapse_y.is_some()
    }

    pub fn palette(&self) -> Option<&HeatmapPalette> {
        self.heatmap.then_some(&self.palette)
    }
}

/// Settings of one aggregation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Header rows/columns of every reference table.
    pub origin: OriginPoint,
    pub attribution: AttributionPolicy,
    pub hours_per_day: f64,
    pub unit: WorkloadUnit,
    pub labels: CoordinateLabels,
    pub export: ExportOptions,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            origin: OriginPoint::new(2, 3),
            attribution: AttributionPolicy::default(),
            hours_per_day: 8.0,
            unit: WorkloadUnit::default(),
            labels: CoordinateLabels::default(),
            export: ExportOptions::default(),
        }
    }
}

impl MatrixConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hours_per_day.is_finite() && self.hours_per_day > 0.0) {
            return Err(ConfigError::HoursPerDay(self.hours_per_day));
        }
        if self.export.collapse_x == Some(0) {
            return Err(ConfigError::CollapseLevel { axis: "x" });
        }
        if self.export.collapse_y == Some(0) {
            return Err(ConfigError::CollapseLevel { axis: "y" });
        }
        Ok(())
    }

    /// Convert person-hours to the configured unit.
    pub fn in_unit(&self, hours: f64) -> f64 {
        match self.unit {
            WorkloadUnit::Day => hours / self.hours_per_day,
            WorkloadUnit::Hour => hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use workload_grid::Color;

    use super::*;

    #[test]
    fn proportional_rates() {
        let policy = AttributionPolicy::Proportional;
        assert_eq!(policy.rates(&[3.0, 1.0]), vec![0.75, 0.25]);
        assert_eq!(policy.rates(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(AttributionPolicy::Equal.rates(&[3.0, 1.0]), vec![0.5, 0.5]);
        assert!(policy.rates(&[]).is_empty());
    }

    #[test]
    fn empty_json_is_the_default() {
        assert_eq!(MatrixConfig::from_json_str("{}").unwrap(), MatrixConfig::default());
    }

    #[test]
    fn partial_json_overrides() {
        let config = MatrixConfig::from_json_str(
            r##"{
                "origin": {"header_rows": 1, "header_cols": 2},
                "attribution": "equal",
                "unit": "hour",
                "labels": {"management": "认证管理"},
                "export": {"heatmap": false, "collapse_x": 1, "palette": {"missing": "#FF101010"}}
            }"##,
        )
        .unwrap();
        assert_eq!(config.origin, OriginPoint::new(1, 2));
        assert_eq!(config.attribution, AttributionPolicy::Equal);
        assert_eq!(config.unit, WorkloadUnit::Hour);
        assert_eq!(config.labels.management, "认证管理");
        assert_eq!(config.labels.unlabeled_task, "unlabeled task");
        assert_eq!(config.export.collapse_x, Some(1));
        assert_eq!(config.export.palette(), None);
        assert_eq!(config.export.palette.missing, Color::new_argb(0xFF10_1010));
        assert_eq!(config.in_unit(4.0), 4.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            MatrixConfig::from_json_str(r#"{"hours_per_day": 0}"#),
            Err(ConfigError::HoursPerDay(_))
        ));
        assert!(matches!(
            MatrixConfig::from_json_str(r#"{"export": {"collapse_y": 0}}"#),
            Err(ConfigError::CollapseLevel { axis: "y" })
        ));
        assert!(matches!(
            MatrixConfig::from_json_str(r#"{"unit": "week"}"#),
            Err(ConfigError::Json(_))
        ));
        assert_eq!(MatrixConfig::default().in_unit(16.0), 2.0);
    }
}
