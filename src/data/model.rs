use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use log::warn;

use crate::error::{ConvertError, Result};

/// Name of the provenance column added when tables are combined.
pub const SOURCE_COLUMN: &str = "source";

/// Identifier of the combined table (and stem of its CSV).
pub const COMBINED_NAME: &str = "combined_output";

// ---------------------------------------------------------------------------
// Table – one input file
// ---------------------------------------------------------------------------

/// One input file held in memory as a single record batch.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    path: Option<PathBuf>,
    batch: RecordBatch,
}

impl Table {
    /// Wrap a batch. Column names must be unique.
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut seen = BTreeSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(ConvertError::DuplicateColumn {
                    path: path.clone().unwrap_or_default(),
                    column: field.name().clone(),
                });
            }
        }
        Ok(Table {
            name: name.into(),
            path,
            batch,
        })
    }

    /// File identifier (the file name stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file, if the table was loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| ConvertError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Read a numeric column as `f64`. Nulls come back as `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if !column.data_type().is_numeric() {
            return Err(ConvertError::NonNumericColumn {
                table: self.name.clone(),
                column: name.to_string(),
                data_type: column.data_type().clone(),
            });
        }
        let floats = cast(column, &DataType::Float64).map_err(|source| ConvertError::Arrow {
            path: self.path.clone().unwrap_or_else(|| PathBuf::from(&self.name)),
            source,
        })?;
        Ok(floats.as_primitive::<Float64Type>().iter().collect())
    }

    /// Row-aligned `(x, y)` pairs. Rows where either side is null or not
    /// finite are dropped.
    pub fn xy_points(&self, x: &str, y: &str) -> Result<Vec<[f64; 2]>> {
        let xs = self.numeric_column(x)?;
        let ys = self.numeric_column(y)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .filter_map(|pair| match pair {
                (Some(xv), Some(yv)) if xv.is_finite() && yv.is_finite() => Some([xv, yv]),
                _ => None,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Dataset – every table of a run, in file order
// ---------------------------------------------------------------------------

/// Loaded tables keyed by file identifier, kept in file-list order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Dataset {
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Dataset { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total rows across all tables.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(Table::num_rows).sum()
    }
}

// ---------------------------------------------------------------------------
// CombinedTable – all tables stacked, with provenance
// ---------------------------------------------------------------------------

/// Rows of every compatible table, tagged with their source identifier.
#[derive(Debug, Clone)]
pub struct CombinedTable {
    table: Table,
    sources: Vec<String>,
}

impl CombinedTable {
    /// Stack the dataset's tables. The first table fixes the column list;
    /// tables with other columns are skipped and returned as errors.
    ///
    /// Returns `None` for the table when nothing could be combined.
    pub fn build(dataset: &Dataset) -> (Option<CombinedTable>, Vec<ConvertError>) {
        let mut skipped = Vec::new();
        let Some(first) = dataset.tables().first() else {
            return (None, skipped);
        };

        let reference = first.batch().schema();
        let expected = first.column_names();

        // Every combined column is nullable: files may disagree on
        // nullability while holding the same columns.
        // Provenance replaces an existing `source` column, otherwise it goes last.
        let source_idx = reference.index_of(SOURCE_COLUMN).ok();
        let mut fields: Vec<Field> = reference
            .fields()
            .iter()
            .map(|f| f.as_ref().clone().with_nullable(true))
            .collect();
        let source_field = Field::new(SOURCE_COLUMN, DataType::Utf8, true);
        match source_idx {
            Some(i) => fields[i] = source_field,
            None => fields.push(source_field),
        }
        let schema = Arc::new(Schema::new(fields));

        let mut batches = Vec::with_capacity(dataset.len());
        let mut sources = Vec::with_capacity(dataset.len());

        for table in dataset.tables() {
            let found = table.column_names();
            if found != expected {
                let err = ConvertError::SchemaMismatch {
                    table: table.name().to_string(),
                    expected: expected.clone(),
                    found,
                };
                warn!("{err}");
                skipped.push(err);
                continue;
            }

            match tag_with_source(table, &schema, source_idx) {
                Ok(batch) => {
                    batches.push(batch);
                    sources.push(table.name().to_string());
                }
                Err(source) => {
                    let err = ConvertError::CombineCast {
                        table: table.name().to_string(),
                        source,
                    };
                    warn!("{err}");
                    skipped.push(err);
                }
            }
        }

        if batches.is_empty() {
            warn!("No matching Parquet files could be combined.");
            return (None, skipped);
        }

        let combined = match concat_batches(&schema, &batches) {
            Ok(batch) => batch,
            Err(source) => {
                skipped.push(ConvertError::Arrow {
                    path: PathBuf::from(COMBINED_NAME),
                    source,
                });
                return (None, skipped);
            }
        };

        let table = Table {
            name: COMBINED_NAME.to_string(),
            path: None,
            batch: combined,
        };
        (Some(CombinedTable { table, sources }), skipped)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Identifiers of the tables that made it in, in row order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    /// Per-row source identifier.
    pub fn source_values(&self) -> Result<Vec<&str>> {
        let column = self.table.column(SOURCE_COLUMN)?;
        let values = column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| ConvertError::NonNumericColumn {
                table: self.table.name.clone(),
                column: SOURCE_COLUMN.to_string(),
                data_type: column.data_type().clone(),
            })?;
        Ok(values.iter().map(|v| v.unwrap_or_default()).collect())
    }
}

/// Cast `table` onto the combined schema and fill in its source column.
fn tag_with_source(
    table: &Table,
    schema: &Arc<Schema>,
    source_idx: Option<usize>,
) -> std::result::Result<RecordBatch, arrow::error::ArrowError> {
    let n = table.num_rows();
    let source: ArrayRef = Arc::new(StringArray::from(vec![table.name(); n]));

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (i, column) in table.batch().columns().iter().enumerate() {
        if Some(i) == source_idx {
            columns.push(source.clone());
            continue;
        }
        let target = schema.field(i).data_type();
        if column.data_type() == target {
            columns.push(column.clone());
        } else {
            columns.push(cast(column, target)?);
        }
    }
    if source_idx.is_none() {
        columns.push(source);
    }

    RecordBatch::try_new(schema.clone(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    use arrow::array::{Float64Array, Int64Array, ListArray};
    use arrow::datatypes::Int32Type;

    fn table(name: &str, columns: Vec<(&str, ArrayRef)>) -> Table {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        Table::new(name, None, batch).unwrap()
    }

    fn weather(name: &str, temps: Vec<f64>, pressures: Vec<f64>) -> Table {
        table(
            name,
            vec![
                ("temperature", Arc::new(Float64Array::from(temps)) as ArrayRef),
                ("pressure", Arc::new(Float64Array::from(pressures)) as ArrayRef),
            ],
        )
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("a", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(Int64Array::from(vec![2])),
            ],
        )
        .unwrap();
        let err = Table::new("dup", Some(PathBuf::from("dup.parquet")), batch).unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateColumn { ref column, .. } if column == "a"));
    }

    #[test]
    fn test_numeric_column_casts_integers() {
        let t = table(
            "ints",
            vec![("n", Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as ArrayRef)],
        );
        assert_eq!(t.numeric_column("n").unwrap(), vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_column_rejects_strings() {
        let t = table(
            "labels",
            vec![("label", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef)],
        );
        let err = t.numeric_column("label").unwrap_err();
        assert!(matches!(err, ConvertError::NonNumericColumn { .. }));
        let err = t.numeric_column("missing").unwrap_err();
        assert!(matches!(err, ConvertError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_xy_points_skip_nulls_and_nan() {
        let t = table(
            "gaps",
            vec![
                (
                    "x",
                    Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0), Some(4.0)])) as ArrayRef,
                ),
                (
                    "y",
                    Arc::new(Float64Array::from(vec![Some(10.0), Some(20.0), Some(f64::NAN), Some(40.0)]))
                        as ArrayRef,
                ),
            ],
        );
        assert_eq!(t.xy_points("x", "y").unwrap(), vec![[1.0, 10.0], [4.0, 40.0]]);
    }

    #[test]
    fn test_combine_keeps_order_and_tags_source() {
        let dataset = Dataset::from_tables(vec![
            weather("sample_1", vec![20.0, 21.0], vec![1.0, 1.1]),
            weather("sample_2", vec![30.0], vec![2.0]),
        ]);
        let (combined, skipped) = CombinedTable::build(&dataset);
        let combined = combined.unwrap();

        assert!(skipped.is_empty());
        assert_eq!(combined.num_rows(), dataset.total_rows());
        assert_eq!(
            combined.table().column_names(),
            vec!["temperature", "pressure", "source"]
        );
        assert_eq!(
            combined.source_values().unwrap(),
            vec!["sample_1", "sample_1", "sample_2"]
        );
        assert_eq!(
            combined.table().numeric_column("temperature").unwrap(),
            vec![Some(20.0), Some(21.0), Some(30.0)]
        );
    }

    #[test]
    fn test_combine_skips_mismatched_columns() {
        let odd = table(
            "odd",
            vec![("humidity", Arc::new(Float64Array::from(vec![0.5])) as ArrayRef)],
        );
        let dataset = Dataset::from_tables(vec![
            weather("a", vec![20.0], vec![1.0]),
            odd,
            weather("b", vec![25.0], vec![2.0]),
        ]);
        let (combined, skipped) = CombinedTable::build(&dataset);
        let combined = combined.unwrap();

        assert_eq!(combined.sources(), ["a", "b"]);
        assert_eq!(combined.num_rows(), 2);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0], ConvertError::SchemaMismatch { ref table, .. } if table == "odd"));
    }

    #[test]
    fn test_combine_casts_to_reference_types() {
        let ints = table(
            "ints",
            vec![
                ("temperature", Arc::new(Int64Array::from(vec![40])) as ArrayRef),
                ("pressure", Arc::new(Int64Array::from(vec![3])) as ArrayRef),
            ],
        );
        let dataset = Dataset::from_tables(vec![weather("floats", vec![20.5], vec![1.5]), ints]);
        let (combined, skipped) = CombinedTable::build(&dataset);

        assert!(skipped.is_empty());
        assert_eq!(
            combined.unwrap().table().numeric_column("pressure").unwrap(),
            vec![Some(1.5), Some(3.0)]
        );
    }

    #[test]
    fn test_combine_accepts_nullable_after_required() {
        let required = RecordBatch::try_from_iter_with_nullable(vec![
            ("temperature", Arc::new(Float64Array::from(vec![20.0, 21.0])) as ArrayRef, false),
            ("pressure", Arc::new(Float64Array::from(vec![1.0, 1.1])) as ArrayRef, false),
        ])
        .unwrap();
        let gaps = table(
            "gaps",
            vec![
                ("temperature", Arc::new(Float64Array::from(vec![Some(30.0), None])) as ArrayRef),
                ("pressure", Arc::new(Float64Array::from(vec![None, Some(2.0)])) as ArrayRef),
            ],
        );
        let dataset = Dataset::from_tables(vec![Table::new("required", None, required).unwrap(), gaps]);
        let (combined, skipped) = CombinedTable::build(&dataset);
        let combined = combined.unwrap();

        assert!(skipped.is_empty());
        assert_eq!(combined.num_rows(), 4);
        assert_eq!(combined.sources(), ["required", "gaps"]);
        assert_eq!(
            combined.table().numeric_column("temperature").unwrap(),
            vec![Some(20.0), Some(21.0), Some(30.0), None]
        );
    }

    #[test]
    fn test_combine_keeps_cast_error() {
        let lists = table(
            "lists",
            vec![
                (
                    "temperature",
                    Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]))
                        as ArrayRef,
                ),
                ("pressure", Arc::new(Float64Array::from(vec![2.0])) as ArrayRef),
            ],
        );
        let dataset = Dataset::from_tables(vec![weather("a", vec![20.0], vec![1.0]), lists]);
        let (combined, skipped) = CombinedTable::build(&dataset);

        assert_eq!(combined.unwrap().sources(), ["a"]);
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0], ConvertError::CombineCast { ref table, .. } if table == "lists"));
        let cause = skipped[0].source().expect("cast error kept");
        assert!(cause.downcast_ref::<arrow::error::ArrowError>().is_some());
    }

    #[test]
    fn test_combine_replaces_existing_source_column() {
        let tagged = table(
            "tagged",
            vec![
                ("source", Arc::new(StringArray::from(vec!["old"])) as ArrayRef),
                ("v", Arc::new(Float64Array::from(vec![1.0])) as ArrayRef),
            ],
        );
        let (combined, _) = CombinedTable::build(&Dataset::from_tables(vec![tagged]));
        let combined = combined.unwrap();

        assert_eq!(combined.table().column_names(), vec!["source", "v"]);
        assert_eq!(combined.source_values().unwrap(), vec!["tagged"]);
    }

    #[test]
    fn test_combine_empty_dataset() {
        let (combined, skipped) = CombinedTable::build(&Dataset::default());
        assert!(combined.is_none());
        assert!(skipped.is_empty());
    }
}
