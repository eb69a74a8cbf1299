use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// The dataset could not be loaded. Loading is all-or-nothing, so any of
/// these leaves no partially populated model behind.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read '{locator}'")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch '{url}'")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed CSV")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON")]
    Json(#[from] serde_json::Error),

    #[error("malformed Arrow data")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("malformed Parquet file")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("'{0}' contains no records")]
    Empty(String),

    #[error("missing required column '{column}' (found: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("row {row}, column '{column}': {reason}")]
    InvalidCell {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("'{indicator}' in '{region}' mixes yearly and monthly periods")]
    MixedPeriods { indicator: String, region: String },
}

// ---------------------------------------------------------------------------
// Querying
// ---------------------------------------------------------------------------

/// A query matched no loaded records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no data for indicator '{indicator}' in region(s) [{}]", .regions.join(", "))]
pub struct NoDataError {
    pub indicator: String,
    pub regions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing chart: {0}")]
    Draw(String),

    #[error("writing plot file '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for RenderError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}
