//! The conversion run: discover → load → CSV → combine → plot.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::export::{csv_path, ensure_dir, write_csv};
use crate::data::loader::{discover_files, load_dataset};
use crate::data::model::{CombinedTable, Dataset, COMBINED_NAME};
use crate::error::{ConvertError, Result};
use crate::plot::render::{save_png, DEFAULT_SIZE};
use crate::plot::{combined_figure, overlay_figure, table_figure, Figure};

/// How plots are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotMode {
    /// Every file in its own colour on one figure.
    #[default]
    Overlay,
    /// One figure from the combined table.
    Combined,
    /// One figure per file, always saved next to the CSVs.
    Separate,
}

/// Columns and layout for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub x: String,
    pub y: String,
    pub mode: PlotMode,
    pub legend: bool,
    /// Where the single figure goes; `None` means show it in a window.
    pub save_fig: Option<PathBuf>,
    pub size: (u32, u32),
}

impl PlotOptions {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        PlotOptions {
            x: x.into(),
            y: y.into(),
            mode: PlotMode::default(),
            legend: false,
            save_fig: None,
            size: DEFAULT_SIZE,
        }
    }
}

/// One run's configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub input_dir: PathBuf,
    /// Defaults to `input_dir`.
    pub out_dir: Option<PathBuf>,
    /// Also write `combined_output.csv`.
    pub combine: bool,
    pub plot: Option<PlotOptions>,
}

impl Options {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Options {
            input_dir: input_dir.into(),
            out_dir: None,
            combine: false,
            plot: None,
        }
    }

    pub fn out_dir(&self) -> &Path {
        self.out_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct Summary {
    pub files_found: usize,
    pub tables_loaded: usize,
    pub csv_files: Vec<PathBuf>,
    pub combined_csv: Option<PathBuf>,
    pub combined_rows: usize,
    pub plots: Vec<PathBuf>,
    /// Figure to show interactively (no `save_fig` given).
    pub pending_figure: Option<Figure>,
    /// Recoverable problems, in the order they happened.
    pub failures: Vec<ConvertError>,
}

impl Summary {
    fn fail(&mut self, err: ConvertError) {
        warn!("{err}");
        self.failures.push(err);
    }
}

/// Run the conversion. Only a missing/empty input directory or an
/// unusable output directory end it early; everything else is collected
/// in [`Summary::failures`].
pub fn run(options: &Options) -> Result<Summary> {
    let files = discover_files(&options.input_dir)?;
    let out_dir = options.out_dir();
    ensure_dir(out_dir)?;

    let mut summary = Summary {
        files_found: files.len(),
        ..Summary::default()
    };
    info!("Found {} Parquet file(s) in {}", files.len(), options.input_dir.display());

    let (loaded, load_failures) = load_dataset(&files);
    summary.tables_loaded = loaded.len();
    summary.failures.extend(load_failures);

    let dataset = claim_outputs(loaded, out_dir, options.combine, &mut summary);

    for table in dataset.tables() {
        let path = csv_path(out_dir, table);
        match write_csv(table, &path) {
            Ok(()) => summary.csv_files.push(path),
            Err(err) => summary.fail(err),
        }
    }

    let wants_combined_plot = matches!(&options.plot, Some(p) if p.mode == PlotMode::Combined);
    let combined = if options.combine || wants_combined_plot {
        let (combined, skipped) = CombinedTable::build(&dataset);
        summary.failures.extend(skipped);
        combined
    } else {
        None
    };

    if options.combine {
        if let Some(combined) = &combined {
            let path = out_dir.join(format!("{COMBINED_NAME}.csv"));
            match write_csv(combined.table(), &path) {
                Ok(()) => {
                    info!("Combined CSV saved: {}", path.display());
                    summary.combined_rows = combined.num_rows();
                    summary.combined_csv = Some(path);
                }
                Err(err) => summary.fail(err),
            }
        }
    }

    if let Some(plot) = &options.plot {
        plot_dataset(plot, &dataset, combined.as_ref(), out_dir, &mut summary);
    }

    Ok(summary)
}

/// Keep the first table for every CSV path. Later tables with the same
/// stem (`a.parquet` next to `a.pq`), and with `combine` an input named
/// like the combined CSV, are reported and dropped from the run.
fn claim_outputs(dataset: Dataset, out_dir: &Path, combine: bool, summary: &mut Summary) -> Dataset {
    let mut claimed = BTreeSet::new();
    if combine {
        claimed.insert(out_dir.join(format!("{COMBINED_NAME}.csv")));
    }

    let mut kept = Vec::with_capacity(dataset.len());
    for table in dataset.tables() {
        let output = csv_path(out_dir, table);
        if claimed.insert(output.clone()) {
            kept.push(table.clone());
        } else {
            let input = table
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(table.name()));
            summary.fail(ConvertError::DuplicateOutput { input, output });
        }
    }
    Dataset::from_tables(kept)
}

fn plot_dataset(
    plot: &PlotOptions,
    dataset: &Dataset,
    combined: Option<&CombinedTable>,
    out_dir: &Path,
    summary: &mut Summary,
) {
    let figure = match plot.mode {
        PlotMode::Separate => {
            if plot.save_fig.is_some() {
                warn!("--save-fig is ignored with separate plots; saving one image per file");
            }
            for table in dataset.tables() {
                let path = out_dir.join(format!("{}_scatter.png", table.name()));
                let saved = table_figure(table, &plot.x, &plot.y)
                    .and_then(|figure| save_png(&figure, &path, plot.size));
                match saved {
                    Ok(()) => summary.plots.push(path),
                    Err(err) => summary.fail(err),
                }
            }
            return;
        }
        PlotMode::Combined => match combined {
            Some(combined) => combined_figure(combined, &plot.x, &plot.y, plot.legend),
            None => {
                warn!("No combined table to plot.");
                return;
            }
        },
        PlotMode::Overlay => {
            let (figure, skipped) = overlay_figure(dataset, &plot.x, &plot.y, plot.legend);
            summary.failures.extend(skipped);
            figure
        }
    };

    let figure = match figure {
        Ok(figure) => figure,
        Err(err) => return summary.fail(err),
    };

    match &plot.save_fig {
        Some(path) => match save_png(&figure, path, plot.size) {
            Ok(()) => summary.plots.push(path.clone()),
            Err(err) => summary.fail(err),
        },
        None => summary.pending_figure = Some(figure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array};
    use arrow::record_batch::RecordBatch;

    use crate::data::model::Table;

    #[test]
    fn test_out_dir_defaults_to_input() {
        let mut options = Options::new("data");
        assert_eq!(options.out_dir(), Path::new("data"));
        options.out_dir = Some(PathBuf::from("csv"));
        assert_eq!(options.out_dir(), Path::new("csv"));
    }

    fn named(name: &str) -> Table {
        let batch = RecordBatch::try_from_iter(vec![(
            "v",
            Arc::new(Float64Array::from(vec![1.0])) as ArrayRef,
        )])
        .unwrap();
        Table::new(name, Some(PathBuf::from(format!("{name}.parquet"))), batch).unwrap()
    }

    #[test]
    fn test_claim_outputs_reserves_combined_name() {
        let dataset = Dataset::from_tables(vec![named("combined_output"), named("a")]);

        let mut summary = Summary::default();
        let kept = claim_outputs(dataset.clone(), Path::new("out"), false, &mut summary);
        assert_eq!(kept.names(), vec!["combined_output", "a"]);
        assert!(summary.failures.is_empty());

        let kept = claim_outputs(dataset, Path::new("out"), true, &mut summary);
        assert_eq!(kept.names(), vec!["a"]);
        assert!(matches!(
            &summary.failures[..],
            [ConvertError::DuplicateOutput { output, .. }] if output == Path::new("out/combined_output.csv")
        ));
    }

    #[test]
    fn test_plot_options_defaults() {
        let plot = PlotOptions::new("temperature", "pressure");
        assert_eq!(plot.mode, PlotMode::Overlay);
        assert_eq!(plot.size, DEFAULT_SIZE);
        assert!(plot.save_fig.is_none());
        assert!(!plot.legend);
    }
}
