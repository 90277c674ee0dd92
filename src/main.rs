use std::process::ExitCode;

fn main() -> ExitCode {
    pq2csv::cli::run()
}
