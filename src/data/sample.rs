use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::export::ensure_dir;
use crate::error::{ConvertError, Result};

/// Temperature range of generated rows.
const TEMPERATURE: (f64, f64) = (20.0, 100.0);
/// Pressure range of generated rows.
const PRESSURE: (f64, f64) = (1.0, 5.0);

/// Minimal deterministic PRNG (xoshiro256**)
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform sample in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

/// A `temperature`/`pressure` batch of `rows` uniform random readings.
pub fn weather_batch(rows: usize, rng: &mut SimpleRng) -> Result<RecordBatch> {
    let temperature: Vec<f64> = (0..rows).map(|_| rng.uniform(TEMPERATURE.0, TEMPERATURE.1)).collect();
    let pressure: Vec<f64> = (0..rows).map(|_| rng.uniform(PRESSURE.0, PRESSURE.1)).collect();

    RecordBatch::try_from_iter_with_nullable(vec![
        ("temperature", Arc::new(Float64Array::from(temperature)) as ArrayRef, false),
        ("pressure", Arc::new(Float64Array::from(pressure)) as ArrayRef, false),
    ])
    .map_err(|source| ConvertError::Arrow {
        path: PathBuf::from("<generated>"),
        source,
    })
}

/// Write `batch` to `path` as a snappy-compressed Parquet file.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let write_err = |source| ConvertError::WriteParquet {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|source| ConvertError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(write_err)?;
    writer.write(batch).map_err(write_err)?;
    writer.close().map_err(write_err)?;
    Ok(())
}

/// Write `count` files `sample_<i>.snappy.parquet` into `dir`, each with
/// `rows` readings. Every file draws from its own seeded stream.
pub fn write_sample_files(dir: &Path, count: usize, rows: usize, seed: u64) -> Result<Vec<PathBuf>> {
    ensure_dir(dir)?;

    (1..=count)
        .map(|i| {
            let mut rng = SimpleRng::new(seed.wrapping_add(i as u64));
            let batch = weather_batch(rows, &mut rng)?;
            let path = dir.join(format!("sample_{i}.snappy.parquet"));
            write_parquet(&path, &batch)?;
            Ok(path)
        })
        .collect()
}
