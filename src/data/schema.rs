use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::loader::RawTable;
use super::model::{CellValue, Period, RawRecord};
use crate::error::DataLoadError;

// ---------------------------------------------------------------------------
// ColumnNames – which source columns carry which field
// ---------------------------------------------------------------------------

/// Mapping from record fields to source column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub region: String,
    pub indicator: String,
    pub period: String,
    pub value: String,
    /// Optional; sources without it produce unit-less series.
    pub unit: Option<String>,
    /// Region assigned to every row when the source has no region column,
    /// e.g. global feeds such as the ArcGIS CO2 service.
    pub default_region: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            region: "Region".into(),
            indicator: "Indicator".into(),
            period: "Year".into(),
            value: "Value".into(),
            unit: Some("Unit".into()),
            default_region: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Convert a raw table into typed records, failing on the first missing
/// column or unconvertible cell, or on a series that mixes yearly and
/// monthly periods.
pub fn validate(table: &RawTable, columns: &ColumnNames) -> Result<Vec<RawRecord>, DataLoadError> {
    let has_region_column = table.has_column(&columns.region);
    let fallback_region = if has_region_column {
        None
    } else {
        Some(
            columns
                .default_region
                .clone()
                .ok_or_else(|| missing_column(table, &columns.region))?,
        )
    };
    for required in [&columns.indicator, &columns.period, &columns.value] {
        if !table.has_column(required) {
            return Err(missing_column(table, required));
        }
    }
    let unit_column = columns
        .unit
        .as_deref()
        .filter(|name| table.has_column(name));

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<RawRecord, DataLoadError> {
            // Row numbers are 1-based, as a spreadsheet would show them.
            let row_no = i + 1;
            let cell = |name: &str| row.get(name).unwrap_or(&CellValue::Null);
            let invalid = |column: &str, reason: String| DataLoadError::InvalidCell {
                row: row_no,
                column: column.to_string(),
                reason,
            };

            let region = match &fallback_region {
                Some(region) => region.clone(),
                None => cell(columns.region.as_str())
                    .as_text()
                    .ok_or_else(|| invalid(columns.region.as_str(), "region is empty".into()))?,
            };
            let indicator = cell(columns.indicator.as_str())
                .as_text()
                .ok_or_else(|| invalid(columns.indicator.as_str(), "indicator is empty".into()))?;
            let period = Period::from_cell(cell(columns.period.as_str()))
                .map_err(|reason| invalid(columns.period.as_str(), reason))?;
            let value = cell(columns.value.as_str())
                .as_measurement()
                .map_err(|reason| invalid(columns.value.as_str(), reason))?;
            let unit = unit_column.and_then(|name| cell(name).as_text());

            Ok(RawRecord {
                region,
                indicator,
                period,
                unit,
                value,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .and_then(|records| {
            check_period_granularity(&records)?;
            Ok(records)
        })
}

/// A series is either yearly or monthly. A bare year and its January share
/// an x position, so a series mixing both cannot be drawn faithfully.
fn check_period_granularity(records: &[RawRecord]) -> Result<(), DataLoadError> {
    let mut monthly: HashMap<(&str, &str), bool> = HashMap::new();
    for rec in records {
        let key = (rec.indicator.as_str(), rec.region.as_str());
        let is_monthly = rec.period.month.is_some();
        if *monthly.entry(key).or_insert(is_monthly) != is_monthly {
            return Err(DataLoadError::MixedPeriods {
                indicator: rec.indicator.clone(),
                region: rec.region.clone(),
            });
        }
    }
    Ok(())
}

fn missing_column(table: &RawTable, column: &str) -> DataLoadError {
    DataLoadError::MissingColumn {
        column: column.to_string(),
        available: table.columns.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse_csv, parse_json};

    #[test]
    fn valid_rows_become_records() {
        let table = parse_csv(
            "Region,Indicator,Year,Value,Unit\n\
             World,Temperature,2020,1.1,Degree Celsius\n\
             World,Temperature,2021,NA,\n"
                .as_bytes(),
        )
        .unwrap();
        let records = validate(&table, &ColumnNames::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region, "World");
        assert_eq!(records[0].period, Period::year(2020));
        assert_eq!(records[0].value, Some(1.1));
        assert_eq!(records[0].unit.as_deref(), Some("Degree Celsius"));
        assert_eq!(records[1].value, None);
        assert_eq!(records[1].unit, None);
    }

    #[test]
    fn missing_required_column_is_a_load_error() {
        let table = parse_csv("Region,Indicator,Value\nWorld,Temperature,1.1\n".as_bytes()).unwrap();
        match validate(&table, &ColumnNames::default()) {
            Err(DataLoadError::MissingColumn { column, available }) => {
                assert_eq!(column, "Year");
                assert_eq!(available, ["Region", "Indicator", "Value"]);
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn unit_column_is_optional() {
        let table = parse_csv("Region,Indicator,Year,Value\nWorld,Temperature,2020,1.1\n".as_bytes())
            .unwrap();
        let records = validate(&table, &ColumnNames::default()).unwrap();
        assert_eq!(records[0].unit, None);
    }

    #[test]
    fn bad_cells_report_row_and_column() {
        let table = parse_csv(
            "Region,Indicator,Year,Value\n\
             World,Temperature,2020,1.1\n\
             World,Temperature,2021,warm\n"
                .as_bytes(),
        )
        .unwrap();
        match validate(&table, &ColumnNames::default()) {
            Err(DataLoadError::InvalidCell { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Value");
            }
            other => panic!("expected InvalidCell, got {other:?}"),
        }

        let table = parse_csv("Region,Indicator,Year,Value\n,Temperature,2020,1.1\n".as_bytes())
            .unwrap();
        assert!(matches!(
            validate(&table, &ColumnNames::default()),
            Err(DataLoadError::InvalidCell { row: 1, .. })
        ));
    }

    #[test]
    fn series_cannot_mix_yearly_and_monthly_periods() {
        let table = parse_csv(
            "Region,Indicator,Year,Value\n\
             World,CO2,2020,412.0\n\
             World,CO2,2020-01,413.1\n"
                .as_bytes(),
        )
        .unwrap();
        assert!(matches!(
            validate(&table, &ColumnNames::default()),
            Err(DataLoadError::MixedPeriods { ref indicator, ref region })
                if indicator == "CO2" && region == "World"
        ));

        // Different series may use different granularities.
        let table = parse_csv(
            "Region,Indicator,Year,Value\n\
             World,Temperature,2020,1.1\n\
             World,CO2,2020-01,413.1\n"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(validate(&table, &ColumnNames::default()).unwrap().len(), 2);
    }

    #[test]
    fn feature_service_layout_with_default_region() {
        let table = parse_json(
            r#"{"features": [
                {"attributes": {"Indicator": "Monthly Atmospheric Co2 Concentrations",
                                "Unit": "Parts Per Million", "Date": "1958M03", "Value": 315.7}}
            ]}"#,
        )
        .unwrap();
        let columns = ColumnNames {
            period: "Date".into(),
            default_region: Some("World".into()),
            ..ColumnNames::default()
        };
        let records = validate(&table, &columns).unwrap();
        assert_eq!(records[0].region, "World");
        assert_eq!(records[0].period, Period::month(1958, 3).unwrap());
        assert_eq!(records[0].unit.as_deref(), Some("Parts Per Million"));

        // Without a fallback the region column is required.
        let strict = ColumnNames {
            default_region: None,
            ..columns
        };
        assert!(matches!(
            validate(&table, &strict),
            Err(DataLoadError::MissingColumn { .. })
        ));
    }
}
