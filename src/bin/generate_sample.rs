use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pq2csv::data::sample::write_sample_files;

/// Write dummy `temperature`/`pressure` Parquet files for trying out pq2csv.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Output directory (created if missing)
    #[arg(long, default_value = "test_data")]
    dir: PathBuf,

    /// Number of files
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Rows per file
    #[arg(long, default_value_t = 50)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match write_sample_files(&args.dir, args.count, args.rows, args.seed) {
        Ok(paths) => {
            for path in paths {
                println!("Saved: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
