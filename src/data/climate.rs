use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info, warn};

use super::filter::{filtered_indices, unique_values, RecordFilter};
use super::loader::{load_table, Source};
use super::model::{Period, RawRecord, SeriesPoint, SeriesSpec};
use super::schema::{validate, ColumnNames};
use crate::chart::ChartSpec;
use crate::error::{DataLoadError, NoDataError};

// ---------------------------------------------------------------------------
// DataModel – the loaded dataset and the queries over it
// ---------------------------------------------------------------------------

/// Immutable, fully validated climate dataset. Built once at startup and
/// shared read-only by every request.
#[derive(Debug, Clone)]
pub struct DataModel {
    source: String,
    records: Vec<RawRecord>,
    indicators: BTreeSet<String>,
    regions: BTreeSet<String>,
    duplicates: usize,
}

impl DataModel {
    /// Load and validate a dataset from a path or URL.
    pub fn load(locator: &str, columns: &ColumnNames) -> Result<Self, DataLoadError> {
        let source = Source::parse(locator);
        let table = load_table(&source)?;
        let records = validate(&table, columns)?;
        let model = Self::from_records(source.to_string(), records);

        info!(
            "loaded {} records ({} indicators, {} regions) from {}",
            model.len(),
            model.indicators.len(),
            model.regions.len(),
            model.source
        );
        if model.duplicates > 0 {
            warn!(
                "{} duplicate (region, indicator, period) rows in {}; later rows win",
                model.duplicates, model.source
            );
        }
        Ok(model)
    }

    /// Build a model from already validated records.
    pub fn from_records(source: impl Into<String>, records: Vec<RawRecord>) -> Self {
        let indicators = unique_values(&records, |r| r.indicator.as_str());
        let regions = unique_values(&records, |r| r.region.as_str());

        let mut seen = HashSet::new();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert((&r.region, &r.indicator, r.period)))
            .count();

        DataModel {
            source: source.into(),
            records,
            indicators,
            regions,
            duplicates,
        }
    }

    /// One indicator in one region, ordered by period.
    ///
    /// Duplicate periods resolve to the row that comes last in the source.
    pub fn get_series(&self, indicator: &str, region: &str) -> Result<SeriesSpec, NoDataError> {
        let hits = filtered_indices(&self.records, &RecordFilter::series(indicator, region));
        if hits.is_empty() {
            return Err(NoDataError {
                indicator: indicator.to_string(),
                regions: vec![region.to_string()],
            });
        }

        let mut by_period: BTreeMap<Period, Option<f64>> = BTreeMap::new();
        let mut unit = None;
        for &idx in &hits {
            let rec = &self.records[idx];
            by_period.insert(rec.period, rec.value);
            if unit.is_none() {
                unit = rec.unit.clone();
            }
        }

        let series = SeriesSpec {
            indicator: indicator.to_string(),
            region: region.to_string(),
            unit,
            points: by_period
                .into_iter()
                .map(|(period, value)| SeriesPoint { period, value })
                .collect(),
        };
        debug!(
            "series {indicator}/{region}: {} rows -> {} points",
            hits.len(),
            series.len()
        );
        Ok(series)
    }

    /// One series per requested region that has data. Regions without data
    /// are omitted and reported on the chart; repeated names count once.
    pub fn build_chart<S: AsRef<str>>(
        &self,
        indicator: &str,
        regions: &[S],
    ) -> Result<ChartSpec, NoDataError> {
        let mut requested: Vec<String> = Vec::with_capacity(regions.len());
        for region in regions {
            let region = region.as_ref().trim();
            if !region.is_empty() && !requested.iter().any(|r| r == region) {
                requested.push(region.to_string());
            }
        }

        let mut series = Vec::with_capacity(requested.len());
        let mut omitted = Vec::new();
        for region in &requested {
            match self.get_series(indicator, region) {
                Ok(s) => series.push(s),
                Err(_) => omitted.push(region.clone()),
            }
        }

        if series.is_empty() {
            return Err(NoDataError {
                indicator: indicator.to_string(),
                regions: requested,
            });
        }
        if !omitted.is_empty() {
            warn!("no '{indicator}' data for region(s) {omitted:?}; omitted from chart");
        }

        Ok(ChartSpec::new(indicator, series, requested.len(), omitted))
    }

    /// Sorted distinct indicator names.
    pub fn indicators(&self) -> &BTreeSet<String> {
        &self.indicators
    }

    /// Sorted distinct region names.
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of duplicate (region, indicator, period) rows seen at load.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
