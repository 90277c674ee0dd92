use std::fs;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Dataset, Table};
use crate::error::{ConvertError, Result};

/// Suffixes recognised as Parquet input, longest first so the stem drops
/// the whole compound extension.
const PARQUET_SUFFIXES: &[&str] = &[".snappy.parquet", ".parquet", ".pq"];

/// Rows shown in the debug preview of each loaded table.
const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// List the Parquet files directly inside `dir`, sorted by file name.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConvertError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| ConvertError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConvertError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && file_stem(&path).is_some() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ConvertError::NoInputFiles {
            path: dir.to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// File identifier: the file name without its Parquet suffix.
///
/// Returns `None` for names that are not Parquet files.
pub fn file_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    PARQUET_SUFFIXES
        .iter()
        .filter(|suffix| lower.ends_with(*suffix) && name.len() > suffix.len())
        .map(|suffix| name[..name.len() - suffix.len()].to_string())
        .next()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load one Parquet file into a [`Table`], concatenating its row groups.
pub fn load_parquet(path: &Path) -> Result<Table> {
    let name = file_stem(path).unwrap_or_else(|| path.display().to_string());

    let file = fs::File::open(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| ConvertError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(|source| ConvertError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()
        .map_err(|source| ConvertError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
    let batch = concat_batches(&schema, &batches).map_err(|source| ConvertError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;

    if log::log_enabled!(log::Level::Debug) {
        let head = batch.slice(0, batch.num_rows().min(PREVIEW_ROWS));
        if let Ok(preview) = pretty_format_batches(&[head]) {
            debug!("{name}: {} rows\n{preview}", batch.num_rows());
        }
    }

    Table::new(name, Some(path.to_path_buf()), batch)
}

/// Load every file, keeping the ones that parse. Failures are logged and
/// handed back so the caller can report them.
pub fn load_dataset(files: &[PathBuf]) -> (Dataset, Vec<ConvertError>) {
    let mut tables = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    for path in files {
        info!("Loading: {}", path.display());
        match load_parquet(path) {
            Ok(table) => tables.push(table),
            Err(err) => {
                warn!("{err}");
                failures.push(err);
            }
        }
    }

    (Dataset::from_tables(tables), failures)
}
