use std::collections::BTreeSet;

use super::model::RawRecord;

// ---------------------------------------------------------------------------
// Filter predicate: which indicator / regions are selected
// ---------------------------------------------------------------------------

/// Record selection. A `None` field means "no constraint"; an empty region
/// set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub indicator: Option<String>,
    pub regions: Option<BTreeSet<String>>,
}

impl RecordFilter {
    /// Select one indicator in one region.
    pub fn series(indicator: &str, region: &str) -> Self {
        RecordFilter {
            indicator: Some(indicator.to_string()),
            regions: Some(BTreeSet::from([region.to_string()])),
        }
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        if let Some(indicator) = &self.indicator {
            if record.indicator != *indicator {
                return false;
            }
        }
        match &self.regions {
            Some(selected) => selected.contains(&record.region),
            None => true,
        }
    }
}

/// Return indices of records that pass the filter, in source order.
pub fn filtered_indices(records: &[RawRecord], filter: &RecordFilter) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filter.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Sorted set of distinct values of one record field.
pub fn unique_values<'a, F>(records: &'a [RawRecord], field: F) -> BTreeSet<String>
where
    F: Fn(&'a RawRecord) -> &'a str,
{
    records.iter().map(|r| field(r).to_string()).collect()
}
