use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (indicator, unit, value in the first year, trend per year, noise)
type IndicatorModel = (&'static str, &'static str, f64, f64, f64);

const INDICATORS: [IndicatorModel; 2] = [
    ("Temperature", "Degree Celsius", -0.1, 0.02, 0.12),
    ("CO2", "Parts Per Million", 317.0, 1.6, 0.4),
];

/// (region, temperature offset, warming multiplier)
const REGIONS: [(&str, f64, f64); 4] = [
    ("World", 0.0, 1.0),
    ("Canada", 0.3, 2.0),
    ("Brazil", 0.1, 0.9),
    ("Australia", 0.2, 1.1),
];

const FIRST_YEAR: i64 = 1960;
const LAST_YEAR: i64 = 2023;
/// Every Nth observation is written as missing.
const MISSING_EVERY: usize = 29;

struct Row {
    region: String,
    indicator: String,
    unit: String,
    year: i64,
    value: Option<f64>,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(indicator, unit, start, trend, noise) in &INDICATORS {
        for &(region, offset, multiplier) in &REGIONS {
            for year in FIRST_YEAR..=LAST_YEAR {
                let elapsed = (year - FIRST_YEAR) as f64;
                let mean = if indicator == "Temperature" {
                    start + offset + trend * multiplier * elapsed
                } else {
                    // CO2 mixes globally; regions differ only by noise.
                    start + trend * elapsed + 0.012 * elapsed * elapsed
                };
                let value = rng.gauss(mean, noise);
                let missing = (rows.len() + 1) % MISSING_EVERY == 0;
                rows.push(Row {
                    region: region.to_string(),
                    indicator: indicator.to_string(),
                    unit: unit.to_string(),
                    year,
                    value: (!missing).then_some((value * 1000.0).round() / 1000.0),
                });
            }
        }
    }
    rows
}

fn write_csv(path: &PathBuf, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["Region", "Indicator", "Year", "Value", "Unit"])?;
    for row in rows {
        let year = row.year.to_string();
        let value = row.value.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([
            row.region.as_str(),
            row.indicator.as_str(),
            year.as_str(),
            value.as_str(),
            row.unit.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &PathBuf, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Region", DataType::Utf8, false),
        Field::new("Indicator", DataType::Utf8, false),
        Field::new("Year", DataType::Int64, false),
        Field::new("Value", DataType::Float64, true),
        Field::new("Unit", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.region.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.indicator.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(rows.iter().map(|r| r.value).collect::<Float64Array>()),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.unit.as_str()))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "data".to_string()));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let csv_path = out_dir.join("sample_climate.csv");
    write_csv(&csv_path, &rows)?;
    let parquet_path = out_dir.join("sample_climate.parquet");
    write_parquet(&parquet_path, &rows)?;

    println!(
        "Wrote {} observations ({} indicators × {} regions × {} years) to {} and {}",
        rows.len(),
        INDICATORS.len(),
        REGIONS.len(),
        LAST_YEAR - FIRST_YEAR + 1,
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
