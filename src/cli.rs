//! Command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use crate::pipeline::{self, Options, PlotMode, PlotOptions, Summary};
use crate::viewer;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "pq2csv")]
#[command(about = "Convert Parquet to CSV with optional combining and plotting", version)]
pub struct Cli {
    /// Folder containing .parquet/.snappy.parquet files
    pub folder: PathBuf,

    /// Also write one combined CSV with a `source` column
    #[arg(long)]
    pub combine: bool,

    /// X-axis column for plotting
    #[arg(long)]
    pub x: Option<String>,

    /// Y-axis column for plotting
    #[arg(long)]
    pub y: Option<String>,

    /// Enable scatterplot of selected columns
    #[arg(long, requires_all = ["x", "y"])]
    pub plot: bool,

    /// Generate separate plots per file
    #[arg(long)]
    pub separate_plots: bool,

    /// Plot the combined table instead of each file
    #[arg(long, conflicts_with = "separate_plots")]
    pub combine_plot: bool,

    /// Path to save the plot (e.g. ./plot.png) instead of opening a window
    #[arg(long)]
    pub save_fig: Option<PathBuf>,

    /// Label and colour points by source file
    #[arg(long)]
    pub legend: bool,

    /// Where CSVs and per-file plots go (defaults to the input folder)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Turn flags into run options.
    pub fn options(&self) -> Options {
        let plot = match (self.plot, &self.x, &self.y) {
            (true, Some(x), Some(y)) => {
                let mode = if self.separate_plots {
                    PlotMode::Separate
                } else if self.combine_plot {
                    PlotMode::Combined
                } else {
                    PlotMode::Overlay
                };
                let mut plot = PlotOptions::new(x, y);
                plot.mode = mode;
                plot.legend = self.legend;
                plot.save_fig = self.save_fig.clone();
                Some(plot)
            }
            _ => None,
        };

        Options {
            input_dir: self.folder.clone(),
            out_dir: self.out_dir.clone(),
            combine: self.combine,
            plot,
        }
    }
}

/// Set up `env_logger`; `-v` raises the default level, `RUST_LOG` still wins.
pub fn setup_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match execute(&cli) {
        Ok(summary) => {
            print_summary(&cli, &summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<Summary> {
    let start = Instant::now();
    let options = cli.options();

    if cli.save_fig.is_some() && options.plot.is_none() {
        info!("--save-fig has no effect without --plot");
    }

    let mut summary = pipeline::run(&options)
        .with_context(|| format!("converting {}", cli.folder.display()))?;
    info!("Finished in {:.2?}", start.elapsed());

    if let Some(figure) = summary.pending_figure.take() {
        if let Err(err) = viewer::show(figure) {
            error!("{err}");
            summary.failures.push(err);
        }
    }

    Ok(summary)
}

fn print_summary(cli: &Cli, summary: &Summary) {
    println!();
    println!("Folder        : {}", cli.folder.display());
    println!("Parquet files : {}", summary.files_found);
    println!("CSV written   : {}", summary.csv_files.len());
    if let Some(path) = &summary.combined_csv {
        println!("Combined CSV  : {} ({} rows)", path.display(), summary.combined_rows);
    }
    for path in &summary.plots {
        println!("Plot          : {}", path.display());
    }
    if !summary.failures.is_empty() {
        println!("Problems      : {}", summary.failures.len());
        for failure in &summary.failures {
            println!("  - {failure}");
        }
    }
}
