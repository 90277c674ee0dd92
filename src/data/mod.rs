/// Data layer: discovery, loading, combining and CSV export.
///
/// Architecture:
/// ```text
///  dir/*.parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  list + parse files → Dataset (one Table per file)
///   └──────────┘
///        │
///        ├──────────────► export   Table → <stem>.csv
///        ▼
///   ┌───────────────┐
///   │ CombinedTable  │  stacked rows + `source` column
///   └───────────────┘
///        │
///        ▼
///      export   → combined_output.csv
/// ```

pub mod export;
pub mod loader;
pub mod model;
pub mod sample;
