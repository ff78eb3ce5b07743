#![warn(clippy::all)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gol_bench::{
    engine, timings_file_name, Backend, BenchmarkConfig, BenchmarkHarness, CsvSink,
    DriverConfig, GridState, HardwareInfo, ProfiledEngine, SimulationConfig, SimulationDriver,
    StepEngine,
};
use std::{path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gol_bench", version, about = "Toroidal Game of Life engines and benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate one field with a single backend
    Run(RunArgs),
    /// Time backends over grid sizes and timestep counts, writing CSV files
    Bench(BenchArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Grid dimension (N x N)
    #[arg(long, default_value_t = 100)]
    size: usize,
    /// Number of generations
    #[arg(long, default_value_t = 50)]
    timesteps: usize,
    /// Probability that a cell starts alive
    #[arg(long, default_value_t = 0.2)]
    p_alive: f64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = Backend::Vectorized)]
    backend: Backend,
    /// Keep a copy of every generation and print its population
    #[arg(long)]
    record_history: bool,
    #[arg(long, default_value_t = DriverConfig::DEFAULT_HISTORY_CELL_LIMIT)]
    history_cell_limit: usize,
    /// Count how often every cell was alive
    #[arg(long)]
    count_alive: bool,
    /// Report per-step timings
    #[arg(long)]
    profile: bool,
}

#[derive(Args)]
struct BenchArgs {
    #[arg(long, value_delimiter = ',', default_values_t = Backend::ALL)]
    backends: Vec<Backend>,
    #[arg(long, value_delimiter = ',', default_values_t = [10, 25])]
    sizes: Vec<usize>,
    #[arg(long, value_delimiter = ',', default_values_t = [100])]
    timesteps: Vec<usize>,
    #[arg(long, default_value_t = 3)]
    repeats: usize,
    #[arg(long, default_value_t = 0.2)]
    p_alive: f64,
    #[arg(long)]
    seed: Option<u64>,
    /// Directory for the timing files
    #[arg(long, default_value = "../output")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Bench(args) => bench(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = SimulationConfig {
        size: args.size,
        timesteps: args.timesteps,
        fill_probability: args.p_alive,
        seed: args.seed,
        backend: args.backend,
        record_history: args.record_history,
        history_cell_limit: args.history_cell_limit,
    };
    config.validate()?;

    let grid = GridState::create(config.size, config.size, config.fill_probability, config.seed)?;
    let engine = engine::create(config.backend, config.size, config.size)
        .with_context(|| format!("cannot start the {} backend", config.backend))?;
    tracing::info!(
        backend = %config.backend,
        size = config.size,
        timesteps = config.timesteps,
        population = grid.population(),
        "starting simulation"
    );

    if args.profile {
        let mut driver = SimulationDriver::new(ProfiledEngine::new(engine), config.driver_config());
        simulate(&mut driver, grid, &config, args.count_alive)?;
        let profile = driver.engine().profile();
        tracing::info!(
            steps = profile.steps,
            total = ?profile.total,
            mean = ?profile.mean(),
            min = ?profile.min,
            max = ?profile.max,
            "step profile"
        );
    } else {
        let mut driver = SimulationDriver::new(engine, config.driver_config());
        simulate(&mut driver, grid, &config, args.count_alive)?;
    }
    Ok(())
}

fn simulate<E: StepEngine>(
    driver: &mut SimulationDriver<E>,
    grid: GridState,
    config: &SimulationConfig,
    count_alive: bool,
) -> Result<()> {
    let timer = Instant::now();
    if count_alive {
        let (last, counts) = driver.run_with_counts(grid, config.timesteps)?;
        tracing::info!(
            generation = last.generation(),
            population = last.population(),
            max_alive_count = counts.max(),
            elapsed = ?timer.elapsed(),
            peak_rss_kib = peak_rss_kib(),
            "finished"
        );
        return Ok(());
    }

    let output = driver.run(grid, config.timesteps, config.record_history)?;
    if config.record_history && output.history.is_empty() && config.timesteps > 0 {
        println!(
            "Problem size > {} cells: history not saved.",
            config.history_cell_limit
        );
    }
    for frame in &output.history {
        println!(
            "generation {:>6}: population {}",
            frame.generation(),
            frame.population()
        );
    }
    tracing::info!(
        generation = output.final_grid.generation(),
        population = output.final_grid.population(),
        elapsed = ?timer.elapsed(),
        peak_rss_kib = peak_rss_kib(),
        "finished"
    );
    Ok(())
}

/// High-water mark of the resident set from `/proc/self/status`.
fn peak_rss_kib() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|value| value.trim().trim_end_matches("kB").trim().parse().ok())
}

fn bench(args: BenchArgs) -> Result<()> {
    let hardware = HardwareInfo::detect();
    tracing::info!(%hardware, "detected hardware");
    let config = BenchmarkConfig {
        backends: args.backends,
        grid_sizes: args.sizes,
        timestep_counts: args.timesteps,
        repeats: args.repeats,
        fill_probability: args.p_alive,
        seed: args.seed,
        output_dir: args.out_dir,
        hardware,
    };
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;

    let identifier = config.hardware.identifier();
    let mut harness = BenchmarkHarness::new(config.clone());
    for &timesteps in &config.timestep_counts {
        let path = config
            .output_dir
            .join(timings_file_name(&identifier, &config.backends, timesteps));
        let mut sink = CsvSink::append(&path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let report = harness.run_matrix(
            &config.backends,
            &config.grid_sizes,
            &[timesteps],
            config.repeats,
            &mut sink,
        )?;
        for skipped in &report.skipped {
            println!("Skipped {}: {}", skipped.combination, skipped.error);
        }
        println!(
            "Saved {} records to {}",
            report.records.len(),
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_rss_is_reported_on_linux() {
        if cfg!(target_os = "linux") {
            assert!(peak_rss_kib().unwrap() > 0);
        }
    }
}
