use crate::{Backend, Result};
use serde::Serialize;
use std::{fs::OpenOptions, io::Write, path::Path};

/// Timing statistics of one (backend, grid size, timesteps) combination.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub hardware: String,
    pub backend: Backend,
    pub grid_size: usize,
    pub timesteps: usize,
    pub repeats: usize,
    #[serde(rename = "mean_time_sec")]
    pub mean_seconds: f64,
    #[serde(rename = "std_dev_sec")]
    pub std_dev_seconds: f64,
}

/// Destination of finished records.
pub trait RecordSink {
    fn write_record(&mut self, record: &BenchmarkRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<BenchmarkRecord> {
    fn write_record(&mut self, record: &BenchmarkRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Comma-separated rows with a header line.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self::with_header(writer, true)
    }

    fn with_header(writer: W, write_header: bool) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(write_header)
                .from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::LifeError::Io(e.into_error()))
    }
}

impl CsvSink<std::fs::File> {
    /// Appends to `path`, writing the header only if the file is new or empty.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        Ok(Self::with_header(file, is_empty))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &BenchmarkRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// `gol_timings_<hardware>_<backends>_ts<timesteps>.csv`, backends sorted by name.
pub fn timings_file_name(hardware: &str, backends: &[Backend], timesteps: usize) -> String {
    let mut names = backends.iter().map(|b| b.name()).collect::<Vec<_>>();
    names.sort_unstable();
    names.dedup();
    format!(
        "gol_timings_{}_{}_ts{}.csv",
        hardware.replace(' ', "_"),
        names.join("_"),
        timesteps
    )
}
