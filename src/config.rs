use crate::{Backend, DriverConfig, HardwareInfo, LifeError, Result};
use std::path::PathBuf;

/// Parameters of a single simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Side of the square field.
    pub size: usize,
    pub timesteps: usize,
    pub fill_probability: f64,
    /// Random seed (if `None`, then random seed is generated)
    pub seed: Option<u64>,
    pub backend: Backend,
    pub record_history: bool,
    pub history_cell_limit: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            size: 100,
            timesteps: 50,
            fill_probability: 0.2,
            seed: None,
            backend: Backend::Vectorized,
            record_history: false,
            history_cell_limit: DriverConfig::DEFAULT_HISTORY_CELL_LIMIT,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        check_size(self.size)?;
        check_probability(self.fill_probability)
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            history_cell_limit: self.history_cell_limit,
        }
    }
}

/// Parameters of a benchmark matrix, passed explicitly to the harness.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkConfig {
    pub backends: Vec<Backend>,
    pub grid_sizes: Vec<usize>,
    pub timestep_counts: Vec<usize>,
    pub repeats: usize,
    pub fill_probability: f64,
    /// Repeat `i` uses `seed + i`; `None` draws fresh entropy every time.
    pub seed: Option<u64>,
    /// Directory for timing files.
    pub output_dir: PathBuf,
    pub hardware: HardwareInfo,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            backends: Backend::ALL.to_vec(),
            grid_sizes: vec![10, 25],
            timestep_counts: vec![100],
            repeats: 3,
            fill_probability: 0.2,
            seed: None,
            output_dir: PathBuf::from("../output"),
            hardware: HardwareInfo::default(),
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 {
            return Err(LifeError::Configuration(
                "repeat count must be at least 1".to_string(),
            ));
        }
        for &size in &self.grid_sizes {
            check_size(size)?;
        }
        check_probability(self.fill_probability)
    }
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(LifeError::Configuration(
            "grid size must be positive".to_string(),
        ));
    }
    Ok(())
}

fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(LifeError::Configuration(format!(
            "fill probability must lie in [0, 1], got {}",
            p
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(BenchmarkConfig::default().validate().is_ok());
        assert_eq!(
            SimulationConfig::default().driver_config(),
            DriverConfig::default()
        );
    }

    #[test]
    fn test_invalid_values() {
        let config = SimulationConfig {
            fill_probability: 1.01,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LifeError::Configuration(_))));

        let config = BenchmarkConfig {
            repeats: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LifeError::Configuration(_))));

        let config = BenchmarkConfig {
            grid_sizes: vec![10, 0],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LifeError::Configuration(_))));
    }
}
