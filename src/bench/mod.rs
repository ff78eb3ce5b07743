mod hardware;
mod harness;
mod record;

pub use hardware::HardwareInfo;
pub use harness::{BenchmarkHarness, BenchmarkReport, Combination, HarnessState, SkippedCombination};
pub use record::{timings_file_name, BenchmarkRecord, CsvSink, RecordSink};
