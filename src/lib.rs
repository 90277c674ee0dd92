//! Convert folders of Parquet files to CSV, optionally combining them and
//! drawing scatter plots of two columns.
//!
//! # Example
//!
//! ```no_run
//! use pq2csv::pipeline::{run, Options, PlotMode, PlotOptions};
//!
//! let mut options = Options::new("test_data");
//! options.combine = true;
//! let mut plot = PlotOptions::new("temperature", "pressure");
//! plot.mode = PlotMode::Combined;
//! plot.legend = true;
//! plot.save_fig = Some("plot.png".into());
//! options.plot = Some(plot);
//!
//! let summary = run(&options).unwrap();
//! println!("{} CSV files written", summary.csv_files.len());
//! ```

pub mod cli;
pub mod color;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod viewer;

pub use data::model::{CombinedTable, Dataset, Table};
pub use error::{ConvertError, Result};
