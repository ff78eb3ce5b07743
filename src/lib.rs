#![warn(clippy::all)]

mod bench;
mod config;
mod driver;
mod error;
mod grid;
mod utils;

pub mod engine;

pub use bench::{
    timings_file_name, BenchmarkHarness, BenchmarkRecord, BenchmarkReport, Combination, CsvSink,
    HardwareInfo, HarnessState, RecordSink, SkippedCombination,
};
pub use config::{BenchmarkConfig, SimulationConfig};
pub use driver::{AliveCounts, DriverConfig, SimulationDriver, SimulationOutput};
pub use engine::{Backend, ProfiledEngine, StepEngine, StepProfile};
pub use error::{LifeError, Result};
pub use grid::GridState;
pub use utils::{mean, sample_std_dev};
