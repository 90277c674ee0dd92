use std::path::PathBuf;

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Everything that can go wrong while converting or plotting.
///
/// Only the "nothing to work on" cases are fatal; the rest are reported
/// per file (or per plot) and the batch keeps going.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("input directory '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("no Parquet files found in '{}'", path.display())]
    NoInputFiles { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("malformed data in '{}': {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("'{}' has more than one column named '{column}'", path.display())]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("failed to create '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create file '{}': {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write Parquet '{}': {source}", path.display())]
    WriteParquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("'{}' would overwrite '{}', which another input already writes", input.display(), output.display())]
    DuplicateOutput { input: PathBuf, output: PathBuf },

    #[error("failed to write CSV '{}': {source}", path.display())]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column '{column}' not found in '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("column '{column}' in '{table}' is not numeric ({data_type})")]
    NonNumericColumn {
        table: String,
        column: String,
        data_type: DataType,
    },

    #[error("skipping '{table}' for combining: columns {found:?} don't match {expected:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("skipping '{table}' for combining: {source}")]
    CombineCast {
        table: String,
        #[source]
        source: ArrowError,
    },

    #[error("nothing to plot for '{title}'")]
    EmptyFigure { title: String },

    #[error("failed to render '{target}': {message}")]
    Render { target: String, message: String },

    #[error("viewer error: {0}")]
    Viewer(String),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Whether the run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::NotFound { .. }
                | ConvertError::NoInputFiles { .. }
                | ConvertError::CreateDir { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let missing = ConvertError::NotFound {
            path: PathBuf::from("nope"),
        };
        let column = ConvertError::ColumnNotFound {
            table: "sample_1".into(),
            column: "humidity".into(),
        };
        assert!(missing.is_fatal());
        assert!(!column.is_fatal());
        assert_eq!(
            column.to_string(),
            "column 'humidity' not found in 'sample_1'"
        );
    }
}
