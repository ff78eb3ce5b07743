use super::{BenchmarkRecord, RecordSink};
use crate::utils::{mean, sample_std_dev};
use crate::{
    engine, Backend, BenchmarkConfig, DriverConfig, GridState, LifeError, Result,
    SimulationDriver, StepEngine,
};
use std::{fmt, time::Instant};

/// One cell of the benchmark matrix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Combination {
    pub backend: Backend,
    pub grid_size: usize,
    pub timesteps: usize,
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} ts{}",
            self.backend, self.grid_size, self.grid_size, self.timesteps
        )
    }
}

/// `Idle -> Running -> Recording -> Idle` per combination, `Done` at the end.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HarnessState {
    Idle,
    Running(Combination),
    Recording(Combination),
    Done,
}

/// A combination that produced no record.
#[derive(Debug)]
pub struct SkippedCombination {
    pub combination: Combination,
    pub error: LifeError,
}

#[derive(Debug, Default)]
pub struct BenchmarkReport {
    pub records: Vec<BenchmarkRecord>,
    pub skipped: Vec<SkippedCombination>,
}

type CreateEngine = fn(Backend, usize, usize) -> Result<Box<dyn StepEngine>>;

/// Times simulations over a matrix of backends, grid sizes and timestep counts.
///
/// Combinations run one after another. Each gets a freshly constructed engine, and
/// each repeat a freshly generated field, so nothing leaks between measurements.
pub struct BenchmarkHarness<F = CreateEngine> {
    config: BenchmarkConfig,
    create_engine: F,
    state: HarnessState,
}

impl BenchmarkHarness {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self::with_engine_factory(config, engine::create)
    }
}

impl<F> BenchmarkHarness<F>
where
    F: FnMut(Backend, usize, usize) -> Result<Box<dyn StepEngine>>,
{
    /// Uses `create_engine` instead of [`engine::create`] to build backends.
    pub fn with_engine_factory(config: BenchmarkConfig, create_engine: F) -> Self {
        Self {
            config,
            create_engine,
            state: HarnessState::Idle,
        }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    /// Runs the matrix described by the harness configuration.
    pub fn run(&mut self, sink: &mut dyn RecordSink) -> Result<BenchmarkReport> {
        let BenchmarkConfig {
            backends,
            grid_sizes,
            timestep_counts,
            repeats,
            ..
        } = self.config.clone();
        self.run_matrix(&backends, &grid_sizes, &timestep_counts, repeats, sink)
    }

    /// Emits one record per combination whose engine could be built and whose
    /// repeats all succeeded. Failed combinations are reported and skipped.
    pub fn run_matrix(
        &mut self,
        backends: &[Backend],
        grid_sizes: &[usize],
        timestep_counts: &[usize],
        repeats: usize,
        sink: &mut dyn RecordSink,
    ) -> Result<BenchmarkReport> {
        BenchmarkConfig {
            grid_sizes: grid_sizes.to_vec(),
            repeats,
            ..self.config.clone()
        }
        .validate()?;

        let hardware = self.config.hardware.identifier();
        let mut report = BenchmarkReport::default();
        for &timesteps in timestep_counts {
            for &grid_size in grid_sizes {
                for &backend in backends {
                    let combination = Combination {
                        backend,
                        grid_size,
                        timesteps,
                    };
                    self.transition(HarnessState::Running(combination));
                    let timings = match self.time_combination(combination, repeats) {
                        Ok(timings) => timings,
                        Err(error) => {
                            tracing::warn!(%combination, %error, "skipping combination");
                            report.skipped.push(SkippedCombination { combination, error });
                            self.transition(HarnessState::Idle);
                            continue;
                        }
                    };

                    self.transition(HarnessState::Recording(combination));
                    let record = BenchmarkRecord {
                        hardware: hardware.clone(),
                        backend,
                        grid_size,
                        timesteps,
                        repeats,
                        mean_seconds: mean(&timings).unwrap_or_default(),
                        std_dev_seconds: sample_std_dev(&timings).unwrap_or_default(),
                    };
                    tracing::info!(
                        %combination,
                        mean = record.mean_seconds,
                        std_dev = record.std_dev_seconds,
                        "recorded"
                    );
                    sink.write_record(&record)?;
                    report.records.push(record);
                    self.transition(HarnessState::Idle);
                }
            }
        }
        sink.flush()?;
        self.transition(HarnessState::Done);
        Ok(report)
    }

    /// Wall-clock seconds of every repeat; the first failure discards them all.
    fn time_combination(&mut self, combination: Combination, repeats: usize) -> Result<Vec<f64>> {
        let Combination {
            backend,
            grid_size,
            timesteps,
        } = combination;
        let engine = (self.create_engine)(backend, grid_size, grid_size)?;
        let mut driver = SimulationDriver::new(engine, DriverConfig::default());

        let mut timings = Vec::with_capacity(repeats);
        for i in 0..repeats {
            let seed = self.config.seed.map(|s| s.wrapping_add(i as u64));
            let grid =
                GridState::create(grid_size, grid_size, self.config.fill_probability, seed)?;
            tracing::debug!(%combination, "run {}/{}", i + 1, repeats);

            let timer = Instant::now();
            driver.run(grid, timesteps, false)?;
            driver.synchronize()?;
            timings.push(timer.elapsed().as_secs_f64());
        }
        Ok(timings)
    }

    fn transition(&mut self, next: HarnessState) {
        tracing::debug!(from = ?self.state, to = ?next, "harness state");
        self.state = next;
    }
}
