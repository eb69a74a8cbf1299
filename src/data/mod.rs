/// Data layer: core types, loading, validation and queries.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / http(s) URL
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read source → RawTable (untyped cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  required columns + cell conversion → Vec<RawRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ climate   │  DataModel: get_series / build_chart
///   └──────────┘
///        │  uses
///        ▼
///   ┌──────────┐
///   │  filter   │  indicator / region predicates → record indices
///   └──────────┘
/// ```

pub mod climate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
