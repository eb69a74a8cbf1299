use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::plot::DEFAULT_SIZE;
use crate::chart::PlotProperties;
use crate::data::schema::ColumnNames;

// ---------------------------------------------------------------------------
// Config – everything the binary needs, from an optional JSON file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset path or URL.
    pub source: String,
    pub bind: SocketAddr,
    pub columns: ColumnNames,
    /// Selection shown when a request does not specify one.
    pub defaults: Selection,
    pub plot: PlotProperties,
    /// Where `render` writes standalone HTML files.
    pub plot_dir: PathBuf,
    pub chart_size: (u32, u32),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: "data/climate.csv".into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            columns: ColumnNames::default(),
            defaults: Selection::default(),
            plot: PlotProperties::default(),
            plot_dir: PathBuf::from("plot_files"),
            chart_size: DEFAULT_SIZE,
        }
    }
}

impl Config {
    /// Read a config file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The file's settings when a path is given, the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection – which indicator and regions to chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub indicator: String,
    pub regions: Vec<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            indicator: "Temperature".into(),
            regions: vec!["World".into()],
        }
    }
}

impl Selection {
    /// Split a comma-separated region list, dropping blanks.
    pub fn parse_regions(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}
