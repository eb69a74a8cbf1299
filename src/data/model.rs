use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table before validation
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from CSV / JSON / Parquet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a label (region, indicator, unit).
    /// Null and blank cells have no label.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            other => Some(other.to_string()),
        }
    }

    /// Interpret the cell as a measurement. `Ok(None)` marks an explicitly
    /// missing value; anything that is neither numeric nor a known
    /// missing-value token is an error.
    pub fn as_measurement(&self) -> Result<Option<f64>, String> {
        match self {
            CellValue::Null => Ok(None),
            CellValue::Integer(i) => Ok(Some(*i as f64)),
            CellValue::Float(v) => finite_or_missing(*v),
            CellValue::Bool(b) => Err(format!("'{b}' is not a number")),
            CellValue::Text(s) => {
                let s = s.trim();
                if is_missing_token(s) {
                    return Ok(None);
                }
                let v = s
                    .parse::<f64>()
                    .map_err(|_| format!("'{s}' is not a number"))?;
                finite_or_missing(v)
            }
        }
    }
}

fn finite_or_missing(v: f64) -> Result<Option<f64>, String> {
    if v.is_nan() {
        Ok(None)
    } else if v.is_infinite() {
        Err(format!("'{v}' is not a finite number"))
    } else {
        Ok(Some(v))
    }
}

fn is_missing_token(s: &str) -> bool {
    s.is_empty()
        || ["na", "n/a", "nan", "null", "none"]
            .iter()
            .any(|tok| s.eq_ignore_ascii_case(tok))
}

// ---------------------------------------------------------------------------
// Period – a year, optionally refined by a month
// ---------------------------------------------------------------------------

/// Time period of an observation. Ordered by year, then month; a bare year
/// sorts before any month of that year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a valid period: {reason}")]
pub struct ParsePeriodError {
    input: String,
    reason: &'static str,
}

impl Period {
    pub fn year(year: i32) -> Self {
        Period { year, month: None }
    }

    /// Returns `None` when `month` is outside 1..=12.
    pub fn month(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Period {
            year,
            month: Some(month),
        })
    }

    /// Position on a continuous x axis: `year + (month - 1) / 12`.
    pub fn x_position(&self) -> f64 {
        let month_offset = self.month.map_or(0.0, |m| f64::from(m - 1) / 12.0);
        f64::from(self.year) + month_offset
    }

    pub fn from_cell(cell: &CellValue) -> Result<Self, String> {
        match cell {
            CellValue::Integer(i) => i32::try_from(*i)
                .map(Period::year)
                .map_err(|_| format!("year {i} is out of range")),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                if *v < f64::from(i32::MIN) || *v > f64::from(i32::MAX) {
                    Err(format!("year {v} is out of range"))
                } else {
                    Ok(Period::year(*v as i32))
                }
            }
            CellValue::Float(v) => Err(format!("'{v}' is not a year")),
            CellValue::Text(s) => s.parse().map_err(|e: ParsePeriodError| e.to_string()),
            CellValue::Bool(b) => Err(format!("'{b}' is not a period")),
            CellValue::Null => Err("period is missing".to_string()),
        }
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    /// Accepts `2020`, `1958M03`, `1958-03` and `1958-03-01`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let err = |reason| ParsePeriodError {
            input: input.to_string(),
            reason,
        };

        let (year_part, rest) = match input.find(|c: char| c == 'M' || c == 'm') {
            Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
            None => match input.get(1..).and_then(|tail| tail.find('-')) {
                Some(idx) => (&input[..idx + 1], Some(&input[idx + 2..])),
                None => (input, None),
            },
        };

        let year: i32 = year_part.parse().map_err(|_| err("bad year"))?;
        let Some(rest) = rest else {
            return Ok(Period::year(year));
        };

        let mut parts = rest.splitn(2, '-');
        let month: u8 = parts
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|_| err("bad month"))?;
        if let Some(day) = parts.next() {
            if day.is_empty() || !day.chars().all(|c| c.is_ascii_digit()) {
                return Err(err("bad day"));
            }
        }
        Period::month(year, month).ok_or_else(|| err("month out of range"))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{}-{m:02}", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one validated row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub region: String,
    pub indicator: String,
    pub period: Period,
    pub unit: Option<String>,
    /// `None` marks a value that is explicitly missing in the source.
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// SeriesSpec – ordered (period, value) pairs for one indicator/region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub period: Period,
    pub value: Option<f64>,
}

/// Periods are unique and strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub indicator: String,
    pub region: String,
    pub unit: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl SeriesSpec {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Split into parallel period / value columns for graphing.
    pub fn transpose(&self) -> (Vec<Period>, Vec<Option<f64>>) {
        self.points.iter().map(|p| (p.period, p.value)).unzip()
    }

    /// Smallest and largest present value.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.value)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Runs of consecutive present values as `(x, y)` coordinates.
    /// A missing value ends the current run.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for point in &self.points {
            match point.value {
                Some(v) => current.push((point.period.x_position(), v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}
