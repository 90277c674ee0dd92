use std::fs;
use std::path::{Path, PathBuf};

use arrow::util::display::{ArrayFormatter, FormatOptions};
use log::info;

use super::model::Table;
use crate::error::{ConvertError, Result};

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| ConvertError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Where the CSV for `table` goes inside `out_dir`.
pub fn csv_path(out_dir: &Path, table: &Table) -> PathBuf {
    out_dir.join(format!("{}.csv", table.name()))
}

/// Write `table` as CSV: one header row, columns in table order, nulls as
/// empty fields.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let csv_err = |source: csv::Error| ConvertError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| ConvertError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.column_names()).map_err(csv_err)?;

    let options = FormatOptions::default().with_null("");
    let batch = table.batch();
    let formatters = batch
        .columns()
        .iter()
        .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(arrow_err)?;

    let mut record = Vec::with_capacity(formatters.len());
    for row in 0..batch.num_rows() {
        record.clear();
        for formatter in &formatters {
            record.push(formatter.value(row).try_to_string().map_err(arrow_err)?);
        }
        writer.write_record(&record).map_err(csv_err)?;
    }

    writer.flush().map_err(|e| csv_err(e.into()))?;
    info!("Saved CSV: {}", path.display());
    Ok(())
}
