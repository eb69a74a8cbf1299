/// Chart layer: presentation metadata and rendering.
///
/// ```text
///   DataModel::build_chart
///        │
///        ▼
///   ┌───────────┐
///   │ ChartSpec  │  series + title, labels, kind, axis ranges
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   plot    │  plotters → SVG string
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   file    │  optional standalone .html on disk
///   └──────────┘
/// ```

pub mod file;
pub mod plot;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::SeriesSpec;

pub const DEFAULT_DATE_LABEL: &str = "Dates";
pub const DEFAULT_VALUE_LABEL: &str = "Values";
pub const DEFAULT_FILE_NAME: &str = "climate_plot";

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Lines with point markers.
    #[default]
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown chart kind '{0}' (expected 'line' or 'bar')")]
pub struct ParseChartKindError(String);

impl FromStr for ChartKind {
    type Err = ParseChartKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" | "lines" => Ok(ChartKind::Line),
            "bar" | "bars" => Ok(ChartKind::Bar),
            _ => Err(ParseChartKindError(s.to_string())),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlotProperties – user-facing presentation options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotProperties {
    pub kind: ChartKind,
    pub date_label: String,
    /// Replaced by the series unit when left at the default and every
    /// series shares one.
    pub value_label: String,
    /// Defaults to the indicator name.
    pub title: Option<String>,
    /// Tighten the y axis around the data instead of anchoring it at zero.
    pub compress_y_axis: bool,
    /// Base name (without `.html`) for plot files written to disk.
    pub file_name: String,
}

impl Default for PlotProperties {
    fn default() -> Self {
        Self {
            kind: ChartKind::Line,
            date_label: DEFAULT_DATE_LABEL.into(),
            value_label: DEFAULT_VALUE_LABEL.into(),
            title: None,
            compress_y_axis: false,
            file_name: DEFAULT_FILE_NAME.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChartSpec
// ---------------------------------------------------------------------------

/// Series plus everything needed to draw them.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub compress_y_axis: bool,
    pub series: Vec<SeriesSpec>,
    /// Number of distinct regions asked for.
    pub requested: usize,
    /// Requested regions that had no data.
    pub omitted: Vec<String>,
}

impl ChartSpec {
    pub fn new(
        indicator: &str,
        series: Vec<SeriesSpec>,
        requested: usize,
        omitted: Vec<String>,
    ) -> Self {
        let mut chart = ChartSpec {
            title: indicator.to_string(),
            x_label: DEFAULT_DATE_LABEL.into(),
            y_label: DEFAULT_VALUE_LABEL.into(),
            kind: ChartKind::default(),
            compress_y_axis: false,
            series,
            requested,
            omitted,
        };
        if let Some(unit) = chart.shared_unit() {
            chart.y_label = unit.to_string();
        }
        chart
    }

    pub fn with_properties(mut self, props: &PlotProperties) -> Self {
        self.kind = props.kind;
        self.compress_y_axis = props.compress_y_axis;
        self.x_label = props.date_label.clone();
        if props.value_label != DEFAULT_VALUE_LABEL {
            self.y_label = props.value_label.clone();
        }
        if let Some(title) = &props.title {
            self.title = title.clone();
        }
        self
    }

    pub fn included(&self) -> usize {
        self.series.len()
    }

    /// `(included, requested)` region counts.
    pub fn coverage(&self) -> (usize, usize) {
        (self.included(), self.requested)
    }

    /// The unit every series reports, if they all agree.
    pub fn shared_unit(&self) -> Option<&str> {
        let first = self.series.first()?.unit.as_deref()?;
        self.series
            .iter()
            .all(|s| s.unit.as_deref() == Some(first))
            .then_some(first)
    }

    /// Smallest gap between distinct x positions; 1.0 for a single period.
    pub fn x_step(&self) -> f64 {
        let mut xs: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.period.x_position()))
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs.windows(2)
            .map(|w| w[1] - w[0])
            .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
            .unwrap_or(1.0)
    }

    /// X axis extent, padded by half a step so edge bars and markers fit.
    pub fn x_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.period.x_position()))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        if !lo.is_finite() {
            return (0.0, 1.0);
        }
        let pad = self.x_step() / 2.0;
        (lo - pad, hi + pad)
    }

    /// Y axis extent.
    ///
    /// By default the axis includes zero and is padded by 5% of the span.
    /// When compressed it runs from 95% of the smallest to 105% of the
    /// largest magnitude.
    pub fn y_range(&self) -> (f64, f64) {
        let bounds = self
            .series
            .iter()
            .filter_map(SeriesSpec::value_bounds)
            .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)));
        let Some((min, max)) = bounds else {
            return (0.0, 1.0);
        };

        let (lo, hi) = if self.compress_y_axis {
            (min - min.abs() * 0.05, max + max.abs() * 0.05)
        } else {
            let lo = min.min(0.0);
            let hi = max.max(0.0);
            let pad = (hi - lo) * 0.05;
            (
                if lo < 0.0 { lo - pad } else { lo },
                if hi > 0.0 { hi + pad } else { hi },
            )
        };
        if hi - lo < f64::EPSILON {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        }
    }
}
