use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, UInt16Array, UInt32Array, UInt8Array,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::CellValue;
use crate::error::DataLoadError;

/// Remote feeds are small; a slow one is treated as unavailable.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// RawTable – parsed, not yet validated rows
// ---------------------------------------------------------------------------

/// Rows keyed by column name, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names in the order first seen.
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, CellValue>>,
}

impl RawTable {
    fn push_row(&mut self, row: BTreeMap<String, CellValue>) {
        for key in row.keys() {
            if !self.columns.contains(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Source – where a dataset comes from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Interpret a locator: `http(s)://` is remote, `file://` and anything
    /// else is a local path.
    pub fn parse(locator: &str) -> Self {
        let locator = locator.trim();
        if locator.starts_with("http://") || locator.starts_with("https://") {
            Source::Url(locator.to_string())
        } else if let Some(path) = locator.strip_prefix("file://") {
            Source::File(PathBuf::from(path))
        } else {
            Source::File(PathBuf::from(locator))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read a source into a [`RawTable`]. A source without rows is an error.
pub fn load_table(source: &Source) -> Result<RawTable, DataLoadError> {
    let table = match source {
        Source::File(path) => load_file(path)?,
        Source::Url(url) => load_url(url)?,
    };
    if table.is_empty() {
        return Err(DataLoadError::Empty(source.to_string()));
    }
    log::debug!(
        "read {} rows with columns {:?} from {source}",
        table.len(),
        table.columns
    );
    Ok(table)
}

/// Load a local file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet file, one observation per row
/// * `.json`    – records array or ArcGIS feature-service response
/// * `.csv`     – header row with column names
pub fn load_file(path: &Path) -> Result<RawTable, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => {
            let text = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
            parse_json(&text)
        }
        "csv" => {
            let file = std::fs::File::open(path).map_err(|source| io_error(path, source))?;
            parse_csv(file)
        }
        other => Err(DataLoadError::UnsupportedFormat(format!(".{other}"))),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DataLoadError {
    DataLoadError::Io {
        locator: path.display().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Remote loader
// ---------------------------------------------------------------------------

/// Fetch a remote dataset. Blocking; call before the async runtime starts.
/// The body is CSV when the URL path ends in `.csv`, JSON otherwise.
fn load_url(url: &str) -> Result<RawTable, DataLoadError> {
    let http_error = |source| DataLoadError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(http_error)?;
    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(http_error)?;

    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    if path.to_ascii_lowercase().ends_with(".csv") {
        parse_csv(body.as_bytes())
    } else {
        parse_json(&body)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two document shapes are accepted.
///
/// Records (the default `df.to_json(orient='records')`):
///
/// ```json
/// [ { "Region": "World", "Indicator": "Temperature", "Year": 2020, "Value": 1.1 } ]
/// ```
///
/// ArcGIS feature-service query responses:
///
/// ```json
/// { "features": [ { "attributes": { "Unit": "Parts Per Million", "Date": "1958M03", "Value": 315.7 } } ] }
/// ```
pub fn parse_json(text: &str) -> Result<RawTable, DataLoadError> {
    let root: JsonValue = serde_json::from_str(text)?;

    let mut table = RawTable::default();
    match &root {
        JsonValue::Array(records) => {
            for (i, rec) in records.iter().enumerate() {
                let obj = rec.as_object().ok_or_else(|| {
                    DataLoadError::UnexpectedShape(format!("record {i} is not a JSON object"))
                })?;
                table.push_row(json_object_to_row(obj));
            }
        }
        JsonValue::Object(obj) => {
            let features = obj
                .get("features")
                .and_then(|f| f.as_array())
                .ok_or_else(|| {
                    DataLoadError::UnexpectedShape("object without a 'features' array".into())
                })?;
            for (i, feature) in features.iter().enumerate() {
                let attrs = feature
                    .get("attributes")
                    .and_then(|a| a.as_object())
                    .ok_or_else(|| {
                        DataLoadError::UnexpectedShape(format!("feature {i} has no 'attributes'"))
                    })?;
                table.push_row(json_object_to_row(attrs));
            }
        }
        _ => {
            return Err(DataLoadError::UnexpectedShape(
                "expected a records array or a feature collection".into(),
            ))
        }
    }
    Ok(table)
}

fn json_object_to_row(obj: &Map<String, JsonValue>) -> BTreeMap<String, CellValue> {
    obj.iter()
        .map(|(key, val)| (key.clone(), json_to_cell(val)))
        .collect()
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per row.
/// Cell types are guessed; schema validation decides what is acceptable.
pub fn parse_csv<R: Read>(input: R) -> Result<RawTable, DataLoadError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RawTable {
        columns: headers.clone(),
        rows: Vec::new(),
    };

    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file, one observation per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Categorical (dictionary-encoded)
/// strings, string views and dates are read as text; any other column type
/// the loader does not understand fails the load.
fn load_parquet(path: &Path) -> Result<RawTable, DataLoadError> {
    let file = std::fs::File::open(path).map_err(|source| io_error(path, source))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    for field in builder.schema().fields() {
        check_column_type(field)?;
    }
    let mut table = RawTable {
        columns: builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect(),
        rows: Vec::new(),
    };
    let reader = builder.build()?;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| -> Result<(String, ArrayRef), DataLoadError> {
                Ok((field.name().clone(), normalize_column(col)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .map(|(name, col)| -> Result<(String, CellValue), DataLoadError> {
                    Ok((name.clone(), extract_cell(name, col, row)?))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            table.rows.push(cells);
        }
    }

    Ok(table)
}

// -- Arrow helpers --

/// Column types whose values [`normalize_column`] turns into plain text.
fn is_textual(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8View | DataType::Date32 | DataType::Date64 => true,
        DataType::Dictionary(_, values) => matches!(
            values.as_ref(),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ),
        _ => false,
    }
}

fn is_scalar(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

fn check_column_type(field: &Field) -> Result<(), DataLoadError> {
    let data_type = field.data_type();
    if is_scalar(data_type) || is_textual(data_type) {
        Ok(())
    } else {
        Err(unsupported_column(field.name(), data_type))
    }
}

fn unsupported_column(name: &str, data_type: &DataType) -> DataLoadError {
    DataLoadError::UnsupportedFormat(format!("column '{name}' has Arrow type {data_type}"))
}

/// Decode dictionaries, string views and dates to `Utf8` so a single
/// extraction path reads them.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef, DataLoadError> {
    if is_textual(col.data_type()) {
        Ok(cast(col, &DataType::Utf8)?)
    } else {
        Ok(Arc::clone(col))
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(name: &str, col: &ArrayRef, row: usize) -> Result<CellValue, DataLoadError> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => int_cell(any.downcast_ref::<Int8Array>().map(|a| a.value(row).into())),
        DataType::Int16 => int_cell(any.downcast_ref::<Int16Array>().map(|a| a.value(row).into())),
        DataType::Int32 => int_cell(any.downcast_ref::<Int32Array>().map(|a| a.value(row).into())),
        DataType::Int64 => int_cell(any.downcast_ref::<Int64Array>().map(|a| a.value(row))),
        DataType::UInt8 => int_cell(any.downcast_ref::<UInt8Array>().map(|a| a.value(row).into())),
        DataType::UInt16 => {
            int_cell(any.downcast_ref::<UInt16Array>().map(|a| a.value(row).into()))
        }
        DataType::UInt32 => {
            int_cell(any.downcast_ref::<UInt32Array>().map(|a| a.value(row).into()))
        }
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => return Err(unsupported_column(name, other)),
    };
    Ok(cell)
}

fn int_cell(value: Option<i64>) -> CellValue {
    value.map_or(CellValue::Null, CellValue::Integer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{Date32Array, DictionaryArray, StringArray, TimestampSecondArray};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn source_parse_distinguishes_urls_and_paths() {
        assert_eq!(
            Source::parse("https://example.org/data.csv"),
            Source::Url("https://example.org/data.csv".into())
        );
        assert_eq!(
            Source::parse("file:///tmp/data.csv"),
            Source::File(PathBuf::from("/tmp/data.csv"))
        );
        assert_eq!(
            Source::parse("data/climate.csv"),
            Source::File(PathBuf::from("data/climate.csv"))
        );
    }

    #[test]
    fn csv_cells_are_typed() {
        let table = parse_csv("Region,Year,Value\nWorld,2020,1.1\nWorld,2021,\n".as_bytes())
            .unwrap();
        assert_eq!(table.columns, ["Region", "Year", "Value"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["Region"], CellValue::Text("World".into()));
        assert_eq!(table.rows[0]["Year"], CellValue::Integer(2020));
        assert_eq!(table.rows[0]["Value"], CellValue::Float(1.1));
        assert_eq!(table.rows[1]["Value"], CellValue::Null);
    }

    #[test]
    fn json_records_and_features_are_accepted() {
        let records = parse_json(r#"[{"Region": "World", "Year": 2020, "Value": 1.1}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.has_column("Value"));

        let features = parse_json(
            r#"{"features": [
                {"attributes": {"Unit": "Parts Per Million", "Date": "1958M03", "Value": 315.7}},
                {"attributes": {"Unit": "Percent", "Date": "1959M03", "Value": null}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features.rows[1]["Value"], CellValue::Null);
        assert_eq!(features.rows[0]["Date"], CellValue::Text("1958M03".into()));
    }

    #[test]
    fn json_with_wrong_shape_is_rejected() {
        assert!(matches!(
            parse_json(r#"{"rows": []}"#),
            Err(DataLoadError::UnexpectedShape(_))
        ));
        assert!(matches!(parse_json("[1, 2]"), Err(DataLoadError::UnexpectedShape(_))));
        assert!(matches!(parse_json("{not json"), Err(DataLoadError::Json(_))));
    }

    #[test]
    fn load_table_rejects_empty_and_unknown_sources() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_temp(&dir, "empty.csv", "Region,Indicator,Year,Value\n");
        assert!(matches!(
            load_table(&Source::File(empty)),
            Err(DataLoadError::Empty(_))
        ));

        let xlsx = write_temp(&dir, "data.xlsx", "");
        assert!(matches!(
            load_table(&Source::File(xlsx)),
            Err(DataLoadError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            load_table(&Source::File(missing)),
            Err(DataLoadError::Io { .. })
        ));
    }

    fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_files_load_as_flat_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climate.parquet");
        let regions: DictionaryArray<Int32Type> = vec!["World", "Canada"].into_iter().collect();
        write_parquet(
            &path,
            vec![
                ("Region", Arc::new(regions) as ArrayRef),
                ("Indicator", Arc::new(StringArray::from(vec!["Temperature", "Temperature"])) as ArrayRef),
                ("Year", Arc::new(Int64Array::from(vec![2020, 2021])) as ArrayRef),
                ("Date", Arc::new(Date32Array::from(vec![18322, 18687])) as ArrayRef),
                ("Value", Arc::new(Float64Array::from(vec![Some(1.1), None])) as ArrayRef),
            ],
        );

        let table = load_table(&Source::File(path)).unwrap();
        assert_eq!(table.columns, ["Region", "Indicator", "Year", "Date", "Value"]);
        assert_eq!(table.rows[0]["Region"], CellValue::Text("World".into()));
        assert_eq!(table.rows[1]["Region"], CellValue::Text("Canada".into()));
        assert_eq!(table.rows[1]["Year"], CellValue::Integer(2021));
        assert_eq!(table.rows[0]["Date"], CellValue::Text("2020-03-01".into()));
        assert_eq!(table.rows[1]["Value"], CellValue::Null);
    }

    #[test]
    fn parquet_columns_of_unknown_type_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamped.parquet");
        write_parquet(
            &path,
            vec![
                ("Region", Arc::new(StringArray::from(vec!["World"])) as ArrayRef),
                ("Observed", Arc::new(TimestampSecondArray::from(vec![1_600_000_000])) as ArrayRef),
            ],
        );

        match load_table(&Source::File(path)) {
            Err(DataLoadError::UnsupportedFormat(message)) => assert!(message.contains("Observed")),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }
}
